use std::fmt;

/// Canonical text operation requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Summarize,
    Explain,
    Rewrite(Tone),
    Translate(TargetLanguage),
    Analyze,
}

impl Action {
    /// Resolve a client action token and its optional modifier.
    ///
    /// Tokens are matched case-insensitively against the English and Spanish names; anything
    /// unrecognised becomes [`Action::Summarize`].
    pub fn parse(action: &str, payload: Option<&str>) -> Self {
        match action.trim().to_lowercase().as_str() {
            "explain" | "explicar" => Action::Explain,
            "rewrite" | "reescribir" => Action::Rewrite(Tone::parse(payload)),
            "translate" | "traducir" => Action::Translate(TargetLanguage::parse(payload)),
            "analyze" | "analizar" | "xray" => Action::Analyze,
            _ => Action::Summarize,
        }
    }

    /// Canonical identifier, as listed by `/ai/actions`.
    pub fn id(&self) -> &'static str {
        match self {
            Action::Summarize => "summarize",
            Action::Explain => "explain",
            Action::Rewrite(_) => "rewrite",
            Action::Translate(_) => "translate",
            Action::Analyze => "analyze",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Register requested for `rewrite`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tone {
    Formal,
    Concise,
    Casual,
    Text,
    /// No usable tone was given.
    #[default]
    Improved,
}

impl Tone {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Tone::Improved;
        };
        match raw.trim().to_lowercase().as_str() {
            "formal" => Tone::Formal,
            "concise" | "conciso" => Tone::Concise,
            "casual" => Tone::Casual,
            "text" | "texto" => Tone::Text,
            _ => Tone::Improved,
        }
    }

    /// Phrase completing "en un tono ..." in the rewrite prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Tone::Formal => "formal y profesional",
            Tone::Concise => "concisa y directa",
            Tone::Casual => "coloquial y casual",
            Tone::Text => "adaptada para mensajes de texto",
            Tone::Improved => "mejorada manteniendo el significado original",
        }
    }
}

/// Translation target drawn from the display language set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetLanguage {
    #[default]
    Spanish,
    English,
    French,
    German,
    Italian,
    Portuguese,
}

impl TargetLanguage {
    /// Case-insensitive code lookup; unknown or missing codes fall back to Spanish.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return TargetLanguage::Spanish;
        };
        match raw.trim().to_lowercase().as_str() {
            "en" => TargetLanguage::English,
            "fr" => TargetLanguage::French,
            "de" => TargetLanguage::German,
            "it" => TargetLanguage::Italian,
            "pt" => TargetLanguage::Portuguese,
            _ => TargetLanguage::Spanish,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TargetLanguage::Spanish => "es",
            TargetLanguage::English => "en",
            TargetLanguage::French => "fr",
            TargetLanguage::German => "de",
            TargetLanguage::Italian => "it",
            TargetLanguage::Portuguese => "pt",
        }
    }

    /// Language name as written inside the Spanish prompt templates.
    pub fn spanish_name(&self) -> &'static str {
        match self {
            TargetLanguage::Spanish => "español",
            TargetLanguage::English => "inglés",
            TargetLanguage::French => "francés",
            TargetLanguage::German => "alemán",
            TargetLanguage::Italian => "italiano",
            TargetLanguage::Portuguese => "portugués",
        }
    }
}
