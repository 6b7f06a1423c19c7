//! Static product catalog: languages, interest reasons, rewrite tones and assistant actions.

use serde::Serialize;

/// Language codes a waitlist member may list as preferred.
pub const ALLOWED_LANGUAGE_CODES: [&str; 11] = [
    "es", "en", "fr", "de", "it", "pt", "zh", "ja", "ko", "ru", "ar",
];

/// Upper bound on preferred languages kept per signup.
pub const MAX_PREFERRED_LANGUAGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub native: &'static str,
}

/// Languages shown to clients and accepted as translation targets.
pub const DISPLAY_LANGUAGES: [LanguageInfo; 6] = [
    LanguageInfo {
        code: "es",
        name: "Spanish",
        native: "Español",
    },
    LanguageInfo {
        code: "en",
        name: "English",
        native: "English",
    },
    LanguageInfo {
        code: "fr",
        name: "French",
        native: "Français",
    },
    LanguageInfo {
        code: "de",
        name: "German",
        native: "Deutsch",
    },
    LanguageInfo {
        code: "it",
        name: "Italian",
        native: "Italiano",
    },
    LanguageInfo {
        code: "pt",
        name: "Portuguese",
        native: "Português",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterestReasonInfo {
    pub id: &'static str,
    pub label: &'static str,
}

pub const INTEREST_REASONS: [InterestReasonInfo; 8] = [
    InterestReasonInfo {
        id: "productivity",
        label: "Mejora mi productividad",
    },
    InterestReasonInfo {
        id: "writing",
        label: "Mejora mi escritura profesional",
    },
    InterestReasonInfo {
        id: "learning",
        label: "Ayuda a aprender idiomas",
    },
    InterestReasonInfo {
        id: "content",
        label: "Creación de contenido",
    },
    InterestReasonInfo {
        id: "students",
        label: "Soy estudiante/investigador",
    },
    InterestReasonInfo {
        id: "business",
        label: "Uso empresarial/equipos",
    },
    InterestReasonInfo {
        id: "accessibility",
        label: "Mejora accesibilidad",
    },
    InterestReasonInfo {
        id: "other",
        label: "Otra razón",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToneInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub const REWRITE_TONES: [ToneInfo; 4] = [
    ToneInfo {
        id: "formal",
        label: "Formal",
        description: "Profesional y respetuoso",
    },
    ToneInfo {
        id: "concise",
        label: "Conciso",
        description: "Directo y al punto",
    },
    ToneInfo {
        id: "casual",
        label: "Casual",
        description: "Coloquial y amigable",
    },
    ToneInfo {
        id: "text",
        label: "Texto",
        description: "Para mensajes rápidos",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub requires_payload: bool,
}

pub const ASSISTANT_ACTIONS: [ActionInfo; 5] = [
    ActionInfo {
        id: "summarize",
        label: "Resumir",
        requires_payload: false,
    },
    ActionInfo {
        id: "explain",
        label: "Explicar",
        requires_payload: false,
    },
    ActionInfo {
        id: "rewrite",
        label: "Reescribir",
        requires_payload: true,
    },
    ActionInfo {
        id: "translate",
        label: "Traducir",
        requires_payload: true,
    },
    ActionInfo {
        id: "analyze",
        label: "Análisis X-Ray",
        requires_payload: false,
    },
];

pub fn is_allowed_language(code: &str) -> bool {
    ALLOWED_LANGUAGE_CODES.contains(&code)
}

pub fn is_interest_reason(code: &str) -> bool {
    INTEREST_REASONS.iter().any(|reason| reason.id == code)
}
