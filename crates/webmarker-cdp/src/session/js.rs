//! JavaScript execution operations for CDP page session.

use serde_json::{Value, json};

use crate::error::CdpError;
use crate::protocol::RemoteObject;

use super::core::PageSession;

/// Object group for every remote object this crate creates.
pub(crate) const OBJECT_GROUP: &str = "webmarker";

fn check_exception(result: &Value) -> Result<(), CdpError> {
    if let Some(exception) = result.get("exceptionDetails") {
        let text = exception["exception"]["description"]
            .as_str()
            .or_else(|| exception["text"].as_str())
            .unwrap_or("Unknown error");
        return Err(CdpError::JavaScript(text.to_string()));
    }
    Ok(())
}

impl PageSession {
    /// Evaluate JavaScript expression.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        check_exception(&result)?;
        Ok(result["result"]["value"].clone())
    }

    /// Evaluate JavaScript and return remote object.
    pub async fn evaluate_handle(&self, expression: &str) -> Result<RemoteObject, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": false,
                    "objectGroup": OBJECT_GROUP,
                })),
            )
            .await?;

        check_exception(&result)?;
        let remote_obj: RemoteObject = serde_json::from_value(result["result"].clone())?;
        Ok(remote_obj)
    }

    /// Call function on remote object.
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, CdpError> {
        let params = json!({
            "objectId": object_id,
            "functionDeclaration": function,
            "arguments": args.into_iter().map(|v| json!({"value": v})).collect::<Vec<_>>(),
            "returnByValue": true,
            "awaitPromise": true,
        });

        let result = self.call("Runtime.callFunctionOn", Some(params)).await?;

        check_exception(&result)?;
        Ok(result["result"]["value"].clone())
    }

    /// Release one remote object.
    pub async fn release_object(&self, object_id: &str) -> Result<(), CdpError> {
        self.call("Runtime.releaseObject", Some(json!({"objectId": object_id})))
            .await?;
        Ok(())
    }

    /// Expose `window[name](payload)` to the page; calls arrive as
    /// `Runtime.bindingCalled` events. Survives navigations.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({"name": name})))
            .await?;
        Ok(())
    }

    /// Run `source` in every document loaded from now on.
    pub async fn add_script_on_new_document(&self, source: &str) -> Result<String, CdpError> {
        let result = self
            .call(
                "Page.addScriptToEvaluateOnNewDocument",
                Some(json!({"source": source})),
            )
            .await?;
        Ok(result["identifier"].as_str().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_prefers_description() {
        let result = json!({
            "result": {"type": "object"},
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": {"description": "TypeError: document.body is null"}
            }
        });
        let err = check_exception(&result).unwrap_err();
        assert!(matches!(err, CdpError::JavaScript(ref m) if m.starts_with("TypeError")));
    }

    #[test]
    fn test_no_exception() {
        assert!(check_exception(&json!({"result": {"type": "undefined"}})).is_ok());
    }
}
