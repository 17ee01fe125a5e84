//! Per-call response assembly

use serde_json::Value;

use crate::{
    error::{Error, Result},
    image::image_url_or_fallback,
    operation::{Contract, OperationKind, OperationResult, OperationSpec, ScenePayload},
};

/// Collects the text of one call and produces its terminal result.
///
/// Free-text calls surface a throttled view of the growing buffer; every
/// delta is kept, so the final delivery is always complete. Structured calls
/// hide deltas and hold the parsed scene payload until the terminal event.
pub struct ResponseAccumulator {
    kind: OperationKind,
    contract: Contract,
    buffer: String,
    payload: Option<ScenePayload>,
    validator: Option<jsonschema::Validator>,
}

impl ResponseAccumulator {
    pub fn new(spec: &OperationSpec) -> Self {
        let validator = spec
            .schema
            .as_ref()
            .and_then(|schema| match jsonschema::validator_for(schema) {
                Ok(validator) => Some(validator),
                Err(e) => {
                    tracing::warn!(
                        "Invalid {} payload schema, skipping validation: {}",
                        spec.kind.as_str(),
                        e
                    );
                    None
                }
            });

        Self {
            kind: spec.kind,
            contract: spec.contract,
            buffer: String::new(),
            payload: None,
            validator,
        }
    }

    /// Text accumulated so far
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Whether a structured payload has been captured
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Append a delta. Returns the buffer when it should be shown.
    pub fn push_delta(&mut self, delta: &str) -> Option<String> {
        if delta.is_empty() || self.contract == Contract::Structured {
            return None;
        }
        self.buffer.push_str(delta);

        let should_deliver = self.buffer.chars().count() % 3 == 0 || delta.contains(' ');
        should_deliver.then(|| self.buffer.clone())
    }

    /// Handle a finished text segment.
    ///
    /// When the contract reconciles done text, text not already in the buffer
    /// is appended and returned for display. Otherwise the buffer stays the
    /// deltas as they arrived. For structured calls the text is parsed and validated; a bad
    /// payload is an error.
    pub fn push_done(&mut self, text: &str) -> Result<Option<String>> {
        match self.contract {
            Contract::FreeText { reconcile_done, .. } => {
                if !reconcile_done || self.buffer.contains(text) {
                    return Ok(None);
                }
                self.buffer.push_str(text);
                Ok(Some(self.buffer.clone()))
            }
            Contract::Structured => {
                self.payload = Some(self.parse_payload(text)?);
                Ok(None)
            }
        }
    }

    /// Consume the accumulator at the terminal event.
    ///
    /// Returns the result and, for free text, the full buffer to deliver one
    /// last time.
    pub fn finish(self) -> Result<(OperationResult, Option<String>)> {
        match self.contract {
            Contract::FreeText { completed_stage, .. } => {
                let final_delivery = (!self.buffer.is_empty()).then(|| self.buffer.clone());
                let completed_stage = completed_stage.to_string();
                let result = match self.kind {
                    OperationKind::Payment => OperationResult::Payment {
                        order_details: self.buffer,
                        completed_stage,
                    },
                    _ => OperationResult::Search {
                        image_url: image_url_or_fallback(&self.buffer),
                        details: self.buffer,
                        completed_stage,
                    },
                };
                Ok((result, final_delivery))
            }
            Contract::Structured => {
                let payload = self.payload.ok_or_else(|| {
                    Error::Payload("response completed without a scene payload".to_string())
                })?;
                Ok((
                    OperationResult::Scene {
                        situation_description: payload.situation_description,
                        image_url: payload.image_url,
                        completed_stage: payload.completed_stage,
                    },
                    None,
                ))
            }
        }
    }

    fn parse_payload(&self, text: &str) -> Result<ScenePayload> {
        let mut value: Value =
            serde_json::from_str(text).map_err(|e| Error::Payload(e.to_string()))?;

        // `description` is accepted in place of `situationDescription`
        if let Some(object) = value.as_object_mut() {
            if !object.contains_key("situationDescription") {
                if let Some(description) = object.remove("description") {
                    object.insert("situationDescription".to_string(), description);
                }
            }
        }

        if let Some(validator) = &self.validator {
            let errors: Vec<String> = validator.iter_errors(&value).map(|e| e.to_string()).collect();
            if !errors.is_empty() {
                return Err(Error::Payload(errors.join("; ")));
            }
        }

        serde_json::from_value(value).map_err(|e| Error::Payload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::FALLBACK_IMAGE_URL;

    #[test]
    fn test_throttle_rule() {
        let mut acc = ResponseAccumulator::new(&OperationSpec::search());
        assert_eq!(acc.push_delta("ab"), None);
        assert_eq!(acc.push_delta("c").as_deref(), Some("abc"));
        assert_eq!(acc.push_delta("d"), None);
        assert_eq!(acc.push_delta(" e").as_deref(), Some("abcd e"));
        assert_eq!(acc.push_delta(""), None);
    }

    #[test]
    fn test_throttle_counts_chars_not_bytes() {
        let mut acc = ResponseAccumulator::new(&OperationSpec::search());
        assert_eq!(acc.push_delta("é"), None);
        assert_eq!(acc.push_delta("é"), None);
        assert_eq!(acc.push_delta("é").as_deref(), Some("ééé"));
    }

    #[test]
    fn test_free_text_is_lossless() {
        let deltas = ["Fo", "u", "nd", " a", " printer", ".", "!", "x"];
        let mut acc = ResponseAccumulator::new(&OperationSpec::search());
        for d in deltas {
            acc.push_delta(d);
        }
        let (result, last) = acc.finish().unwrap();
        assert_eq!(last.as_deref(), Some(deltas.concat().as_str()));
        assert_eq!(result.text(), deltas.concat());
        assert_eq!(result.completed_stage(), "search");
        assert_eq!(result.image_url(), Some(FALLBACK_IMAGE_URL));
    }

    #[test]
    fn test_done_text_reconciliation() {
        let mut acc = ResponseAccumulator::new(&OperationSpec::payment());
        acc.push_delta("Order ");
        assert_eq!(acc.push_done("Order ").unwrap(), None);

        let mut acc = ResponseAccumulator::new(&OperationSpec::payment());
        assert_eq!(
            acc.push_done("Order #42 paid").unwrap().as_deref(),
            Some("Order #42 paid")
        );
        let (result, _) = acc.finish().unwrap();
        assert_eq!(
            result,
            OperationResult::Payment {
                order_details: "Order #42 paid".into(),
                completed_stage: "confirm".into()
            }
        );
    }

    #[test]
    fn test_search_ignores_done_text() {
        let mut acc = ResponseAccumulator::new(&OperationSpec::search());
        acc.push_delta("Red ");
        acc.push_delta("lamp");
        assert_eq!(acc.push_done("Red big lamp").unwrap(), None);

        let (result, last) = acc.finish().unwrap();
        assert_eq!(last.as_deref(), Some("Red lamp"));
        assert_eq!(result.text(), "Red lamp");
    }

    #[test]
    fn test_empty_free_text_has_no_final_delivery() {
        let acc = ResponseAccumulator::new(&OperationSpec::payment());
        let (_, last) = acc.finish().unwrap();
        assert_eq!(last, None);
    }

    #[test]
    fn test_structured_hides_deltas_and_holds_payload() {
        let mut acc = ResponseAccumulator::new(&OperationSpec::scene());
        assert_eq!(acc.push_delta("{\"situation"), None);
        assert_eq!(acc.text(), "");

        let done = r#"{"situationDescription":"Desk setup","image_url":"https://x/scene.png","completedStage":"select"}"#;
        assert_eq!(acc.push_done(done).unwrap(), None);
        assert!(acc.has_payload());

        let (result, last) = acc.finish().unwrap();
        assert_eq!(last, None);
        assert_eq!(
            result,
            OperationResult::Scene {
                situation_description: "Desk setup".into(),
                image_url: "https://x/scene.png".into(),
                completed_stage: "select".into()
            }
        );
    }

    #[test]
    fn test_structured_accepts_description_alias() {
        let mut acc = ResponseAccumulator::new(&OperationSpec::scene());
        acc.push_done(r#"{"description":"Desk","image_url":"u","completedStage":"select"}"#)
            .unwrap();
        let (result, _) = acc.finish().unwrap();
        assert_eq!(result.text(), "Desk");
    }

    #[test]
    fn test_structured_rejects_bad_payloads() {
        let mut acc = ResponseAccumulator::new(&OperationSpec::scene());
        assert!(matches!(acc.push_done("not json"), Err(Error::Payload(_))));
        assert!(matches!(
            acc.push_done(r#"{"situationDescription":"x","completedStage":"select"}"#),
            Err(Error::Payload(_))
        ));
        assert!(matches!(
            acc.push_done(r#"{"situationDescription":"x","image_url":"u","completedStage":7}"#),
            Err(Error::Payload(_))
        ));
    }

    #[test]
    fn test_structured_without_payload_fails() {
        let acc = ResponseAccumulator::new(&OperationSpec::scene());
        assert!(matches!(acc.finish(), Err(Error::Payload(_))));
    }
}
