use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// A typed payload exchanged between codecs and handlers.
///
/// Codecs only see the erased form: they decode into a `serde_json::Value`
/// and call [`Model::load`], or read the model back through
/// [`Model::to_value`]. Every `Serialize + DeserializeOwned` type gets the
/// implementation for free, so `Pet`, `Vec<Pet>`, `String` and `Value` are
/// all models.
pub trait Model: Any + Send + Sync + fmt::Debug {
    /// 以解碼後的值取代目前內容
    fn load(&mut self, value: Value) -> serde_json::Result<()>;

    fn to_value(&self) -> serde_json::Result<Value>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> Model for T
where
    T: Serialize + DeserializeOwned + Any + Send + Sync + fmt::Debug,
{
    fn load(&mut self, value: Value) -> serde_json::Result<()> {
        *self = serde_json::from_value(value)?;
        Ok(())
    }

    fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn Model {
    pub fn downcast_ref<T: Model>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: Model>(self: Box<Self>) -> Option<T> {
        self.into_any().downcast::<T>().ok().map(|model| *model)
    }
}

/// Owned, type-erased model instance.
pub type Payload = Box<dyn Model>;

/// Identity produced by a successful authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(Value);

impl Principal {
    pub fn new(identity: impl Into<Value>) -> Self {
        Self(identity.into())
    }

    pub fn identity(&self) -> &Value {
        &self.0
    }

    /// 當身分是單純的使用者名稱時
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(name) => f.write_str(name),
            other => write!(f, "{}", other),
        }
    }
}

/// Credential material handed to a validator.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Token(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"***").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: i64,
        name: String,
    }

    #[test]
    fn test_model_load_replaces_contents() {
        let mut model: Payload = Box::new(Sample::default());
        model.load(json!({"id": 7, "name": "rex"})).unwrap();

        let sample = model.downcast_ref::<Sample>().unwrap();
        assert_eq!(sample.id, 7);
        assert_eq!(sample.name, "rex");
    }

    #[test]
    fn test_model_load_rejects_wrong_shape() {
        let mut model: Payload = Box::new(Sample::default());
        assert!(model.load(json!({"id": "not a number"})).is_err());
    }

    #[test]
    fn test_downcast_to_wrong_type_is_none() {
        let model: Payload = Box::new(String::from("hello"));
        assert!(model.downcast_ref::<Sample>().is_none());
        assert_eq!(model.downcast::<String>().as_deref(), Some("hello"));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let basic = Credentials::Basic {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        };
        let rendered = format!("{:?}", basic);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("s3cret"));

        let token = format!("{:?}", Credentials::Token("token123".to_string()));
        assert!(!token.contains("token123"));
    }

    #[test]
    fn test_principal_display() {
        assert_eq!(Principal::new("admin").to_string(), "admin");
        assert_eq!(Principal::new(json!({"id": 1})).to_string(), r#"{"id":1}"#);
    }
}
