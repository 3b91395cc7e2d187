use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Response generator unavailable: {0}")]
    Unavailable(String),

    #[error("Response generator returned no text")]
    EmptyOutput,
}

/// Opaque text generator behind the safety layer. Never called when a
/// verdict blocks AI output.
pub trait ResponseGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

impl<F> ResponseGenerator for F
where
    F: Fn(&str) -> Result<String, GeneratorError>,
{
    fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        self(prompt)
    }
}

/// Wrap the sanitized query in delimiters for the generator prompt.
pub fn build_prompt(sanitized_query: &str) -> String {
    format!("<PATIENT_QUERY>\n{sanitized_query}\n</PATIENT_QUERY>")
}
