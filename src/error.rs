use wasm_bindgen::JsValue;

#[derive(thiserror::Error, Debug)]
pub enum DomError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("element not found: {0}")]
    MissingElement(String),

    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        DomError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

pub type DomResult<T> = Result<T, DomError>;
