use serde::Serialize;
use serde_json::Value;

/// Streaming JSON write primitives consumed by resolvers.
///
/// Implementations own separator and nesting bookkeeping; callers only
/// announce structure. A writer serves one event at a time. Methods are
/// infallible: an implementation that can fail must record the failure
/// itself rather than surface it to resolvers.
pub trait JsonWriter {
    fn write_null(&mut self);
    fn write_bool(&mut self, value: bool);
    fn write_i64(&mut self, value: i64);
    fn write_u64(&mut self, value: u64);
    fn write_f64(&mut self, value: f64);
    fn write_string(&mut self, value: &str);
    fn start_object(&mut self);
    fn write_field_name(&mut self, name: &str);
    fn end_object(&mut self);
    fn start_array(&mut self);
    fn end_array(&mut self);

    /// Write an arbitrary JSON value through the primitives above.
    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.write_null(),
            Value::Bool(b) => self.write_bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    self.write_u64(u);
                } else if let Some(i) = n.as_i64() {
                    self.write_i64(i);
                } else if let Some(f) = n.as_f64() {
                    self.write_f64(f);
                } else {
                    self.write_null();
                }
            }
            Value::String(s) => self.write_string(s),
            Value::Array(items) => {
                self.start_array();
                for item in items {
                    self.write_value(item);
                }
                self.end_array();
            }
            Value::Object(map) => {
                self.start_object();
                for (key, item) in map {
                    self.write_field_name(key);
                    self.write_value(item);
                }
                self.end_object();
            }
        }
    }

    /// Convenience for `write_field_name` followed by `write_string`.
    fn write_string_field(&mut self, name: &str, value: &str) {
        self.write_field_name(name);
        self.write_string(value);
    }
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    first: bool,
}

/// Compact JSON writer buffering into memory.
///
/// Scalars and strings are encoded with `serde_json`, so escaping matches
/// what `serde_json::to_string` produces.
#[derive(Debug, Default)]
pub struct BufferedJsonWriter {
    buf: Vec<u8>,
    scopes: Vec<Scope>,
    after_field_name: bool,
}

impl BufferedJsonWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        BufferedJsonWriter {
            buf: Vec::with_capacity(capacity),
            scopes: Vec::new(),
            after_field_name: false,
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.scopes.clear();
        self.after_field_name = false;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_string(self) -> String {
        match String::from_utf8(self.buf) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    fn before_value(&mut self) {
        if self.after_field_name {
            self.after_field_name = false;
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            if !scope.first {
                self.buf.push(b',');
            }
            scope.first = false;
        }
    }

    fn encode<T: Serialize + ?Sized>(&mut self, value: &T) {
        self.before_value();
        if serde_json::to_writer(&mut self.buf, value).is_err() {
            self.buf.extend_from_slice(b"null");
        }
    }
}

impl JsonWriter for BufferedJsonWriter {
    fn write_null(&mut self) {
        self.before_value();
        self.buf.extend_from_slice(b"null");
    }

    fn write_bool(&mut self, value: bool) {
        self.encode(&value);
    }

    fn write_i64(&mut self, value: i64) {
        self.encode(&value);
    }

    fn write_u64(&mut self, value: u64) {
        self.encode(&value);
    }

    fn write_f64(&mut self, value: f64) {
        // serde_json writes non-finite floats as null.
        self.encode(&value);
    }

    fn write_string(&mut self, value: &str) {
        self.encode(value);
    }

    fn start_object(&mut self) {
        self.before_value();
        self.buf.push(b'{');
        self.scopes.push(Scope { first: true });
    }

    fn write_field_name(&mut self, name: &str) {
        self.encode(name);
        self.buf.push(b':');
        self.after_field_name = true;
    }

    fn end_object(&mut self) {
        self.scopes.pop();
        self.after_field_name = false;
        self.buf.push(b'}');
    }

    fn start_array(&mut self) {
        self.before_value();
        self.buf.push(b'[');
        self.scopes.push(Scope { first: true });
    }

    fn end_array(&mut self) {
        self.scopes.pop();
        self.buf.push(b']');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_separators() {
        let mut w = BufferedJsonWriter::with_capacity(64);
        w.start_object();
        w.write_string_field("a", "x");
        w.write_field_name("b");
        w.start_array();
        w.write_i64(-1);
        w.write_u64(2);
        w.start_object();
        w.end_object();
        w.write_null();
        w.end_array();
        w.write_field_name("c");
        w.write_bool(true);
        w.end_object();
        assert_eq!(w.into_string(), r#"{"a":"x","b":[-1,2,{},null],"c":true}"#);
    }

    #[test]
    fn test_string_escaping() {
        let mut w = BufferedJsonWriter::default();
        w.write_string("line\n\t\"quoted\"");
        assert_eq!(w.into_string(), r#""line\n\t\"quoted\"""#);
    }

    #[test]
    fn test_non_finite_float_is_null() {
        let mut w = BufferedJsonWriter::default();
        w.start_array();
        w.write_f64(f64::NAN);
        w.write_f64(1.5);
        w.end_array();
        assert_eq!(w.into_string(), "[null,1.5]");
    }

    #[test]
    fn test_write_value_matches_serde_json() {
        let value = json!({"k": [1, "two", {"three": 3.5}], "n": null, "b": false});
        let mut w = BufferedJsonWriter::default();
        w.write_value(&value);
        assert_eq!(w.into_string(), serde_json::to_string(&value).unwrap());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut w = BufferedJsonWriter::default();
        w.start_array();
        w.write_i64(1);
        w.clear();
        w.write_i64(2);
        assert_eq!(w.as_bytes(), b"2");
    }

    #[test]
    fn test_unbalanced_end_does_not_panic() {
        let mut w = BufferedJsonWriter::default();
        w.end_object();
        w.end_array();
        assert_eq!(w.len(), 2);
    }
}
