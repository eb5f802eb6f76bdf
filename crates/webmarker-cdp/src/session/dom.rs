//! DOM operations for CDP page session.

use serde_json::json;

use crate::error::CdpError;
use crate::protocol::{BoxModel, DomNode};

use super::core::PageSession;

impl PageSession {
    /// Get the document node with its direct children.
    ///
    /// Calling this invalidates every node id handed out before, so callers
    /// cache the result until `DOM.documentUpdated`.
    pub async fn get_document(&self) -> Result<DomNode, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": 1})))
            .await?;

        let root: DomNode = serde_json::from_value(result["root"].clone())?;
        Ok(root)
    }

    /// First descendant of `node_id` matching `selector`.
    pub async fn query_selector(&self, node_id: i64, selector: &str) -> Result<Option<i64>, CdpError> {
        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({
                    "nodeId": node_id,
                    "selector": selector,
                })),
            )
            .await?;

        match result["nodeId"].as_i64().unwrap_or(0) {
            0 => Ok(None),
            id => Ok(Some(id)),
        }
    }

    /// All descendants of `node_id` matching `selector`, in document order.
    pub async fn query_selector_all(&self, node_id: i64, selector: &str) -> Result<Vec<i64>, CdpError> {
        let result = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({
                    "nodeId": node_id,
                    "selector": selector,
                })),
            )
            .await?;

        let node_ids: Vec<i64> = result["nodeIds"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();

        Ok(node_ids)
    }

    /// Describe a node without its children.
    pub async fn describe_node(&self, node_id: i64) -> Result<DomNode, CdpError> {
        let result = self
            .call("DOM.describeNode", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(serde_json::from_value(result["node"].clone())?)
    }

    /// Flat `[name, value, ...]` attribute list of an element.
    pub async fn get_attributes(&self, node_id: i64) -> Result<Vec<String>, CdpError> {
        let result = self
            .call("DOM.getAttributes", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(serde_json::from_value(result["attributes"].clone())?)
    }

    pub async fn set_attribute_value(&self, node_id: i64, name: &str, value: &str) -> Result<(), CdpError> {
        self.call(
            "DOM.setAttributeValue",
            Some(json!({"nodeId": node_id, "name": name, "value": value})),
        )
        .await?;
        Ok(())
    }

    pub async fn remove_attribute(&self, node_id: i64, name: &str) -> Result<(), CdpError> {
        self.call(
            "DOM.removeAttribute",
            Some(json!({"nodeId": node_id, "name": name})),
        )
        .await?;
        Ok(())
    }

    pub async fn remove_node(&self, node_id: i64) -> Result<(), CdpError> {
        self.call("DOM.removeNode", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(())
    }

    /// Get box model for node; `None` when the node is not rendered.
    pub async fn get_box_model(&self, node_id: i64) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await;

        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            Err(e) if e.is_server_error() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve node to a runtime object id.
    pub async fn resolve_node(&self, node_id: i64) -> Result<String, CdpError> {
        let result = self
            .call(
                "DOM.resolveNode",
                Some(json!({"nodeId": node_id, "objectGroup": super::js::OBJECT_GROUP})),
            )
            .await?;

        result["object"]["objectId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing objectId".to_string()))
    }

    /// Node id for a runtime object; the document must have been requested first.
    pub async fn request_node(&self, object_id: &str) -> Result<i64, CdpError> {
        let result = self
            .call("DOM.requestNode", Some(json!({"objectId": object_id})))
            .await?;
        result["nodeId"]
            .as_i64()
            .filter(|id| *id != 0)
            .ok_or_else(|| CdpError::InvalidResponse("Missing nodeId".to_string()))
    }
}

/// Axis-aligned bounds of a quad as `(x, y, width, height)`.
pub(crate) fn quad_bounds(quad: &[f64]) -> Option<(f64, f64, f64, f64)> {
    if quad.len() < 8 {
        return None;
    }
    let xs = [quad[0], quad[2], quad[4], quad[6]];
    let ys = [quad[1], quad[3], quad[5], quad[7]];
    let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min_x, min_y, max_x - min_x, max_y - min_y))
}
