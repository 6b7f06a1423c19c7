//! Prompt templates for the hosted text generator.
//!
//! Templates are plain Spanish literals; [`build_prompt`] only substitutes the user text and
//! the action modifier.

use super::action::{Action, TargetLanguage, Tone};

/// Instructions sent ahead of every action prompt.
pub const SYSTEM_PREAMBLE: &str = "Eres Cliro, un asistente de escritura integrado en el navegador.

Responde siempre en el idioma solicitado por la tarea; si la tarea no indica ninguno, responde en el idioma del texto original.

Devuelve únicamente el resultado pedido, sin saludos, sin explicaciones adicionales y sin repetir estas instrucciones.
";

/// Full prompt for `action` applied to `text`.
pub fn build_prompt(action: Action, text: &str) -> String {
    let task = match action {
        Action::Summarize => summarize_prompt(text),
        Action::Explain => explain_prompt(text),
        Action::Rewrite(tone) => rewrite_prompt(text, tone),
        Action::Translate(language) => translate_prompt(text, language),
        Action::Analyze => analyze_prompt(text),
    };
    format!("{SYSTEM_PREAMBLE}\n{task}")
}

fn summarize_prompt(text: &str) -> String {
    format!(
        "Resume el siguiente texto de manera concisa y clara, preservando los puntos principales.

TEXTO:
{text}

RESUMEN:
"
    )
}

fn explain_prompt(text: &str) -> String {
    format!(
        "Explica el siguiente texto de manera simple y clara, como si se lo explicaras a alguien que no está familiarizado con el tema.

TEXTO:
{text}

EXPLICACIÓN:
"
    )
}

fn rewrite_prompt(text: &str, tone: Tone) -> String {
    let tone = tone.description();
    format!(
        "Reescribe el siguiente texto en un tono {tone}. Mantén el significado original pero mejora la claridad y fluidez.

TEXTO ORIGINAL:
{text}

TEXTO REESCRITO:
"
    )
}

fn translate_prompt(text: &str, language: TargetLanguage) -> String {
    let name = language.spanish_name();
    let heading = name.to_uppercase();
    format!(
        "Traduce el siguiente texto al {name}. Mantén el tono, estilo y significado original.

TEXTO ORIGINAL:
{text}

TRADUCCIÓN ({heading}):
"
    )
}

fn analyze_prompt(text: &str) -> String {
    format!(
        r#"Analiza el siguiente texto y proporciona un análisis detallado de posibles mejoras en formato JSON:

1. **Errores gramaticales**: Lista de errores con correcciones
2. **Errores de estilo**: Sugerencias para mejorar claridad y fluidez
3. **Sugerencias de vocabulario**: Palabras alternativas más precisas
4. **Puntuación general** (1-10): Con sugerencias de mejora

TEXTO:
{text}

ANÁLISIS (en formato JSON):
{{
  "grammar_errors": [],
  "style_errors": [],
  "vocabulary_suggestions": [],
  "overall_score": 0,
  "improvement_suggestions": []
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_prompt_names_target_and_keeps_source() {
        let action = Action::parse("translate", Some("en"));
        let prompt = build_prompt(action, "El gato está sobre la mesa");

        assert!(prompt.contains("TRADUCCIÓN (INGLÉS):"));
        assert!(prompt.contains("Traduce el siguiente texto al inglés."));
        assert!(prompt.contains("El gato está sobre la mesa"));
    }

    #[test]
    fn rewrite_without_tone_asks_for_improvement() {
        let prompt = build_prompt(Action::parse("rewrite", None), "hola que tal");
        assert!(prompt.contains("en un tono mejorada manteniendo el significado original"));
    }

    #[test]
    fn unknown_action_uses_summary_template() {
        let prompt = build_prompt(Action::parse("unknown", None), "texto");
        assert!(prompt.contains("RESUMEN:"));
    }

    #[test]
    fn analyze_prompt_requests_structured_critique() {
        let prompt = build_prompt(Action::Analyze, "Yo tener un perro");
        assert!(prompt.contains("\"overall_score\": 0"));
        assert!(prompt.contains("Yo tener un perro"));
    }

    #[test]
    fn every_prompt_starts_with_preamble() {
        for action in [
            Action::Summarize,
            Action::Explain,
            Action::Rewrite(Tone::Formal),
            Action::Translate(TargetLanguage::German),
            Action::Analyze,
        ] {
            assert!(build_prompt(action, "x").starts_with(SYSTEM_PREAMBLE));
        }
    }
}
