use crate::interop::{new_obj, set_kv};
use plotmap::GeometryError;
use wasm_bindgen::JsValue;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn is_ok(v: &JsValue) -> bool {
    js_sys::Reflect::get(v, &JsValue::from_str("ok"))
        .ok()
        .and_then(|b| b.as_bool())
        .unwrap_or(false)
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    set_kv(&root, "error", &e.into());
    root.into()
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{}' must be finite", param), Some(d.into()))
}

#[inline]
pub fn invalid_id(kind: &str, id: usize) -> JsValue {
    let d = new_obj();
    set_kv(&d, "kind", &JsValue::from_str(kind));
    set_kv(&d, "id", &JsValue::from_f64(id as f64));
    err("invalid_id", format!("invalid {} id", kind), Some(d.into()))
}

#[inline]
pub fn invalid_json(message: impl Into<String>) -> JsValue {
    err("invalid_json", message, None)
}

#[inline]
pub fn edit_disabled() -> JsValue {
    err("edit_disabled", "edit mode is disabled", None)
}

#[inline]
pub fn persist_failed(message: impl Into<String>) -> JsValue {
    err("persist_failed", message, None)
}

pub fn geometry(e: &GeometryError) -> JsValue {
    match *e {
        GeometryError::InvalidIndex { index, len } => {
            let d = new_obj();
            set_kv(&d, "index", &JsValue::from_f64(index as f64));
            set_kv(&d, "len", &JsValue::from_f64(len as f64));
            err("invalid_index", e.to_string(), Some(d.into()))
        }
        GeometryError::TooFewVertices { len } => {
            let d = new_obj(); set_kv(&d, "len", &JsValue::from_f64(len as f64));
            err("too_few_vertices", e.to_string(), Some(d.into()))
        }
        GeometryError::NonFinite => err("non_finite", e.to_string(), None),
        GeometryError::UnknownPolygon { index } => invalid_id("polygon", index),
        GeometryError::EditDisabled => edit_disabled(),
    }
}
