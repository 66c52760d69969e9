use crate::domain::model::Model;
use crate::domain::ports::{Consumer, Producer};
use crate::utils::error::CodecError;
use serde_json::Value;
use std::io::{Read, Write};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Consumer for JsonCodec {
    fn consume(&self, reader: &mut dyn Read, target: &mut dyn Model) -> Result<(), CodecError> {
        let value: Value = serde_json::from_reader(reader)?;
        target.load(value)?;
        Ok(())
    }
}

impl Producer for JsonCodec {
    fn produce(&self, writer: &mut dyn Write, source: &dyn Model) -> Result<(), CodecError> {
        let value = source.to_value()?;
        serde_json::to_writer(writer, &value)?;
        Ok(())
    }
}

/// `application/x-yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Consumer for YamlCodec {
    fn consume(&self, reader: &mut dyn Read, target: &mut dyn Model) -> Result<(), CodecError> {
        let value: Value = serde_yaml::from_reader(reader)?;
        target.load(value)?;
        Ok(())
    }
}

impl Producer for YamlCodec {
    fn produce(&self, writer: &mut dyn Write, source: &dyn Model) -> Result<(), CodecError> {
        let value = source.to_value()?;
        let text = serde_yaml::to_string(&value)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// TOML only represents tables at the top level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl Consumer for TomlCodec {
    fn consume(&self, reader: &mut dyn Read, target: &mut dyn Model) -> Result<(), CodecError> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let text = String::from_utf8(raw)?;
        let value: Value = toml::from_str(&text)?;
        target.load(value)?;
        Ok(())
    }
}

impl Producer for TomlCodec {
    fn produce(&self, writer: &mut dyn Write, source: &dyn Model) -> Result<(), CodecError> {
        let value = source.to_value()?;
        if !value.is_object() {
            return Err(CodecError::Unrepresentable(format!(
                "TOML documents must be tables, got {}",
                json_kind(&value)
            )));
        }
        // 先完整序列化，失敗時不會寫出部分內容
        let text = toml::to_string(&value)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

/// `text/plain`: strings verbatim, anything else as compact JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextProducer;

impl Producer for TextProducer {
    fn produce(&self, writer: &mut dyn Write, source: &dyn Model) -> Result<(), CodecError> {
        match source.to_value()? {
            Value::String(text) => writer.write_all(text.as_bytes())?,
            other => writer.write_all(other.to_string().as_bytes())?,
        }
        Ok(())
    }
}

/// Accepts any input and leaves the target untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubConsumer;

impl Consumer for StubConsumer {
    fn consume(&self, _reader: &mut dyn Read, _target: &mut dyn Model) -> Result<(), CodecError> {
        Ok(())
    }
}

/// Writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubProducer;

impl Producer for StubProducer {
    fn produce(&self, _writer: &mut dyn Write, _source: &dyn Model) -> Result<(), CodecError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::petstore::{Pet, Tag};
    use crate::domain::model::Payload;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: i64,
        items: Vec<String>,
        paid: bool,
    }

    fn sample() -> Order {
        Order {
            id: 12,
            items: vec!["kibble".to_string(), "leash".to_string()],
            paid: true,
        }
    }

    fn orders() -> Vec<Order> {
        vec![
            sample(),
            Order::default(),
            Order {
                id: -7,
                items: vec![],
                paid: false,
            },
            Order {
                id: i64::MAX,
                items: vec!["飼料".to_string(), "żółw 🐢".to_string(), "".to_string()],
                paid: true,
            },
        ]
    }

    fn pets() -> Vec<Pet> {
        vec![
            Pet::default(),
            Pet {
                id: 3,
                name: "Nemo".to_string(),
                photo_urls: vec!["https://example.com/nemo.png".to_string()],
                status: "sold".to_string(),
                tags: vec![
                    Tag {
                        id: 1,
                        name: "fish".to_string(),
                    },
                    Tag {
                        id: -2,
                        name: "小丑魚".to_string(),
                    },
                ],
            },
        ]
    }

    fn round_trip<C, T>(codec: &C, original: &T) -> T
    where
        C: Consumer + Producer,
        T: Model + Default,
    {
        let mut bytes = Vec::new();
        codec.produce(&mut bytes, original).unwrap();

        let mut decoded: Payload = Box::new(T::default());
        codec.consume(&mut bytes.as_slice(), &mut *decoded).unwrap();
        decoded.downcast::<T>().unwrap()
    }

    #[test]
    fn test_json_round_trip() {
        for order in orders() {
            assert_eq!(round_trip(&JsonCodec, &order), order);
        }
        for pet in pets() {
            assert_eq!(round_trip(&JsonCodec, &pet), pet);
        }
    }

    #[test]
    fn test_yaml_round_trip() {
        for order in orders() {
            assert_eq!(round_trip(&YamlCodec, &order), order);
        }
        for pet in pets() {
            assert_eq!(round_trip(&YamlCodec, &pet), pet);
        }
        let names = vec!["Rex".to_string(), "Tom".to_string()];
        assert_eq!(round_trip(&YamlCodec, &names), names);
    }

    #[test]
    fn test_toml_round_trip() {
        for order in orders() {
            assert_eq!(round_trip(&TomlCodec, &order), order);
        }
        for pet in pets() {
            assert_eq!(round_trip(&TomlCodec, &pet), pet);
        }
    }

    #[test]
    fn test_yaml_decodes_pet_document() {
        let document = "name: Rex\nphotoUrls:\n  - rex.png\ntags:\n  - id: 1\n    name: dog\n";
        let mut pet = Pet::default();
        YamlCodec.consume(&mut document.as_bytes(), &mut pet).unwrap();
        assert_eq!(pet.name, "Rex");
        assert_eq!(pet.photo_urls, vec!["rex.png".to_string()]);
        assert_eq!(pet.tags[0].name, "dog");

        let result = YamlCodec.consume(&mut &b"name: [unclosed"[..], &mut pet);
        assert!(matches!(result, Err(CodecError::Yaml(_))));
    }

    #[test]
    fn test_json_decode_failure() {
        let mut target = Order::default();
        let result = JsonCodec.consume(&mut &b"{\"id\": \"twelve\"}"[..], &mut target);
        assert!(matches!(result, Err(CodecError::Json(_))));

        let result = JsonCodec.consume(&mut &b"{broken"[..], &mut target);
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_rejects_non_table() {
        let mut bytes = Vec::new();
        let result = TomlCodec.produce(&mut bytes, &vec![1, 2, 3]);
        assert!(matches!(result, Err(CodecError::Unrepresentable(_))));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_text_producer() {
        let mut bytes = Vec::new();
        TextProducer.produce(&mut bytes, &"hello".to_string()).unwrap();
        assert_eq!(bytes, b"hello");

        let mut bytes = Vec::new();
        TextProducer.produce(&mut bytes, &json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_stubs_do_nothing() {
        let mut target = sample();
        StubConsumer.consume(&mut &b"<pet/>"[..], &mut target).unwrap();
        assert_eq!(target, sample());

        let mut bytes = Vec::new();
        StubProducer.produce(&mut bytes, &target).unwrap();
        assert!(bytes.is_empty());
    }
}
