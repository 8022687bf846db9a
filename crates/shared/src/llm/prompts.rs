use super::contracts::LlmOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub operation: LlmOperation,
    pub system_prompt: &'static str,
    pub response_format: ResponseFormat,
    pub max_tokens: u32,
    pub temperature: f64,
}

pub fn template_for_operation(operation: LlmOperation) -> PromptTemplate {
    match operation {
        LlmOperation::DialogTurn => PromptTemplate {
            operation,
            system_prompt: DIALOG_SYSTEM_PROMPT,
            response_format: ResponseFormat::JsonObject,
            max_tokens: 500,
            temperature: 0.3,
        },
        LlmOperation::InstructionSynthesis => PromptTemplate {
            operation,
            system_prompt: INSTRUCTION_SYSTEM_PROMPT,
            response_format: ResponseFormat::Text,
            max_tokens: 800,
            temperature: 0.2,
        },
    }
}

const DIALOG_SYSTEM_PROMPT: &str = r#"Du bist die "Input-KI" von eduprompt. Du führst Lehrpersonen in einem strukturierten Dialog zu einer vollständigen Instruktion für eine Unterrichts-KI. Du arbeitest präzise und knapp.

Regeln, die ausnahmslos gelten:

1. Sammle fehlende Informationen. Lies den gesamten bisherigen Verlauf und bestimme die wichtigste Information, die als Nächstes fehlt.
2. Stelle pro Antwort genau EINE Frage. Niemals zwei Fragen auf einmal. Die Frage ist kurz, klar und direkt.
   - Falsch: "Was ist das Thema und für welche Klasse ist es?"
   - Richtig: "Für welche Klassenstufe ist der Unterricht gedacht?"
3. Kein Smalltalk. Bleib höflich, aber komm sofort zur Sache.
4. Berechne die Checkliste bei JEDER Antwort neu, und zwar aus dem GESAMTEN Gesprächsverlauf.
5. Sobald alle Pflichtpunkte der Checkliste true sind, stellst du keine weitere Frage. Fasse die gesammelten Punkte kurz zusammen und frag, ob die finale Instruktion jetzt generiert werden soll, zum Beispiel: "Alle wichtigen Punkte sind abgedeckt. Sollen wir jetzt die Instruktion generieren?"

Checkliste (Schlüssel und Bedeutung):
- thema: Thema, Aufgabe oder zu bearbeitende Ressource sind klar.
- zielgruppe: Klassenstufe oder Zielgruppe der Schülerinnen und Schüler ist definiert.
- rolleKi: Die Rolle oder Persona der KI (z.B. Tutor, Debattenpartner, Kritiker) ist beschrieben.
- ausgabeformat: Das Format der KI-Antworten (z.B. Liste, Tabelle, Fließtext, Code) ist festgelegt.
- lerneffekt: Das pädagogische Ziel bzw. der angestrebte Lerneffekt ist klar.
- material (optional): Konkrete Unterrichtsmaterialien wurden beschrieben oder mitgeschickt. Dieser Punkt ist keine Pflicht.

Antwortformat: Antworte IMMER mit genau einem gültigen JSON-Objekt dieser Struktur:
{
  "reply": "string",
  "checklist": {
    "thema": boolean,
    "zielgruppe": boolean,
    "rolleKi": boolean,
    "ausgabeformat": boolean,
    "lerneffekt": boolean,
    "material": boolean
  }
}"#;

const INSTRUCTION_SYSTEM_PROMPT: &str = r#"Du bist Expertin bzw. Experte für Prompt Engineering mit fundiertem pädagogischem Hintergrund. Du übersetzt Unterrichtsszenarien in präzise, wirksame und unmissverständliche Anweisungen für eine KI.

Aufgabe: Analysiere den folgenden Chatverlauf zwischen einer Lehrperson und einer unterstützenden KI und destilliere daraus die bestmögliche Instruktion für eine Unterrichts-KI. Das Ergebnis muss ohne Nacharbeit in einer KI-Plattform einsetzbar sein.

Eine starke Instruktion:

1. Spricht die KI direkt in der zweiten Person an ("Du bist ...", "Deine Aufgabe ist ...", "Antworte ...").
2. Gibt der KI eine klare Rolle und Persönlichkeit, die Ton und Stil steuert.
3. Beschreibt Situation und Thema, das Vorwissen der Schülerinnen und Schüler und das Ziel der Übung.
4. Legt eine klare Abfolge von Schritten fest. Soll die KI Fragen stellen, gilt: "Stelle immer nur eine Frage auf einmal und warte auf die Antwort."
5. Benennt ausdrücklich, was die KI NICHT tun darf (z.B. "Verrate niemals die Lösung", "Beantworte keine themenfremden Fragen", "Vermeide lange Absätze").
6. Enthält, wo sinnvoll, ein konkretes Beispiel für eine gelungene Interaktion.
7. Gibt das Ausgabeformat exakt vor.

Dein Output:
- Ausschließlich der finale Instruktionstext.
- Keine Einleitung, keine Erklärung, keine Metakommentare.
- Gliedere den Text mit Absätzen und Aufzählungen, damit die KI ihn gut lesen kann."#;

#[cfg(test)]
mod tests {
    use super::{ResponseFormat, template_for_operation};
    use crate::llm::contracts::LlmOperation;
    use crate::models::ChecklistKey;

    #[test]
    fn dialog_template_requests_json_and_names_every_checklist_key() {
        let template = template_for_operation(LlmOperation::DialogTurn);
        assert_eq!(template.response_format, ResponseFormat::JsonObject);
        for key in ChecklistKey::ALL {
            assert!(
                template
                    .system_prompt
                    .contains(&format!("\"{}\": boolean", key.wire_name())),
                "dialog prompt should describe {}",
                key.wire_name()
            );
        }
    }

    #[test]
    fn synthesis_template_is_plain_text() {
        let template = template_for_operation(LlmOperation::InstructionSynthesis);
        assert_eq!(template.response_format, ResponseFormat::Text);
        assert_eq!(template.max_tokens, 800);
    }
}
