// Copyright 2025 Rebuttal (https://github.com/rebuttal)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Server-authored verdict and after-end text.
//!
//! Only the server utters these lines; the LLM is prompt-constrained never
//! to declare an end on its own. Unknown or unlocked languages fall back to
//! English.

use crate::state::DebateState;

const VERDICT_LINES: &[(&str, &str)] = &[
    (
        "en",
        "On balance, the opposing argument addressed key counters with evidence and causality. I concede the point.",
    ),
    (
        "es",
        "En conjunto, el argumento contrario abordó los puntos clave con evidencia y causalidad. Cedo el punto.",
    ),
    (
        "pt",
        "No conjunto, o argumento oposto tratou os pontos-chave com evidência e causalidade. Eu cedo o ponto.",
    ),
    (
        "fr",
        "Dans l'ensemble, l'argument adverse a répondu aux points clés avec des preuves et une chaîne causale. J'accorde le point.",
    ),
    (
        "de",
        "Insgesamt hat das Gegenargument die wichtigsten Einwände mit Belegen und Kausalität adressiert. Ich gebe den Punkt ab.",
    ),
    (
        "it",
        "Nel complesso, l'argomentazione opposta ha affrontato i punti chiave con prove e causalità. Concedo il punto.",
    ),
];

const AFTER_END_LINES: &[(&str, &str)] = &[
    (
        "en",
        "The debate has already ended. Please start a new conversation if you want to debate another topic.",
    ),
    (
        "es",
        "El debate ya terminó. Por favor inicia una nueva conversación si quieres debatir otro tema.",
    ),
    (
        "pt",
        "O debate já terminou. Por favor, inicie uma nova conversa se quiser debater outro tema.",
    ),
    (
        "fr",
        "Le débat est déjà terminé. Veuillez démarrer une nouvelle conversation pour débattre d'un autre sujet.",
    ),
    (
        "de",
        "Die Debatte ist bereits beendet. Bitte beginne eine neue Unterhaltung, um ein anderes Thema zu diskutieren.",
    ),
    (
        "it",
        "Il dibattito è già terminato. Avvia una nuova conversazione se vuoi discutere un altro argomento.",
    ),
];

fn lookup(table: &[(&str, &str)], lang: &str) -> String {
    let lang = lang.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(code, _)| *code == lang)
        .or_else(|| table.iter().find(|(code, _)| *code == "en"))
        .map(|(_, line)| (*line).to_string())
        .unwrap_or_default()
}

/// The short localized sentence ending a match.
pub fn build_verdict(state: &DebateState) -> String {
    lookup(VERDICT_LINES, &state.lang)
}

/// The reply given to any turn arriving after the match has ended.
pub fn after_end_message(state: &DebateState) -> String {
    lookup(AFTER_END_LINES, &state.lang)
}
