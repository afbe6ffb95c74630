//! FFI bindings for heartrisk
//!
//! This module provides C-compatible functions for calling the predictor from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `heartrisk_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::error::RiskError;
use crate::form::FormSpec;
use crate::pipeline::{predict_json, RiskPredictor};
use crate::report::ReportEncoder;
use crate::types::PatientRecord;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Map a result to an owned C string, recording the error on failure
fn result_to_cstr(result: Result<String, RiskError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Load the model in `model_dir`, predict one JSON record and return the report JSON.
///
/// # Safety
/// - `model_dir` and `json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `heartrisk_free_string`.
/// - Returns NULL on error; call `heartrisk_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_predict_json(
    model_dir: *const c_char,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(dir) = cstr_to_string(model_dir) else {
        set_last_error("Invalid model directory string pointer");
        return ptr::null_mut();
    };
    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    result_to_cstr(predict_json(Path::new(&dir), &json_str))
}

// ============================================================================
// Predictor Handle API
// ============================================================================

/// Opaque handle to a loaded RiskPredictor
pub struct RiskPredictorHandle {
    predictor: RiskPredictor,
    form: FormSpec,
    reports: ReportEncoder,
}

impl RiskPredictorHandle {
    fn predict(&self, json: &str) -> Result<String, RiskError> {
        let record: PatientRecord =
            serde_json::from_str(json).map_err(|e| RiskError::SchemaMismatch(e.to_string()))?;
        let prediction = self.predictor.predict_checked(&self.form, &record)?;
        let report = self.reports.encode(&prediction, self.predictor.model_id());
        Ok(serde_json::to_string(&report)?)
    }
}

/// Load a predictor from a model artifact directory.
///
/// Inputs are validated against the canonical form bounds until
/// `heartrisk_predictor_set_form` replaces them.
///
/// # Safety
/// - `model_dir` must be a valid null-terminated C string.
/// - Must be freed with `heartrisk_predictor_free`.
/// - Returns NULL on error; call `heartrisk_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_predictor_load(
    model_dir: *const c_char,
) -> *mut RiskPredictorHandle {
    clear_last_error();

    let Some(dir) = cstr_to_string(model_dir) else {
        set_last_error("Invalid model directory string pointer");
        return ptr::null_mut();
    };

    match RiskPredictor::load(Path::new(&dir)) {
        Ok(predictor) => Box::into_raw(Box::new(RiskPredictorHandle {
            predictor,
            form: FormSpec::canonical(),
            reports: ReportEncoder::new(),
        })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a predictor.
///
/// # Safety
/// - `predictor` must be a valid pointer returned by `heartrisk_predictor_load`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_predictor_free(predictor: *mut RiskPredictorHandle) {
    if !predictor.is_null() {
        drop(Box::from_raw(predictor));
    }
}

/// Predict one JSON patient record and return the risk report JSON.
///
/// # Safety
/// - `predictor` must be a valid pointer returned by `heartrisk_predictor_load`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `heartrisk_free_string`.
/// - Returns NULL on error; call `heartrisk_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_predictor_predict(
    predictor: *const RiskPredictorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if predictor.is_null() {
        set_last_error("Null predictor pointer");
        return ptr::null_mut();
    }
    let handle = &*predictor;

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    result_to_cstr(handle.predict(&json_str))
}

/// Replace the input bounds used by `heartrisk_predictor_predict`.
///
/// # Safety
/// - `predictor` must be a valid pointer returned by `heartrisk_predictor_load`.
/// - `form_json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_predictor_set_form(
    predictor: *mut RiskPredictorHandle,
    form_json: *const c_char,
) -> i32 {
    clear_last_error();

    if predictor.is_null() {
        set_last_error("Null predictor pointer");
        return -1;
    }
    let handle = &mut *predictor;

    let Some(json_str) = cstr_to_string(form_json) else {
        set_last_error("Invalid form JSON string pointer");
        return -1;
    };

    match FormSpec::from_json(&json_str) {
        Ok(form) => {
            handle.form = form;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by heartrisk functions.
///
/// # Safety
/// - `ptr` must be a pointer returned by a heartrisk function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next heartrisk function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the heartrisk library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn heartrisk_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ForestConfig;
    use crate::dataset::{LabeledDataset, SAMPLE_CSV};
    use crate::training::{train, TrainingConfig};
    use crate::types::sample_record;
    use std::ffi::CString;
    use tempfile::TempDir;

    fn saved_model() -> TempDir {
        let dir = TempDir::new().unwrap();
        let dataset = LabeledDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        let config = TrainingConfig {
            forest: ForestConfig {
                n_trees: 10,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        };
        train(&dataset, &config)
            .unwrap()
            .artifacts
            .save(dir.path())
            .unwrap();
        dir
    }

    fn c_path(dir: &TempDir) -> CString {
        CString::new(dir.path().to_str().unwrap()).unwrap()
    }

    fn sample_json() -> CString {
        CString::new(serde_json::to_string(&sample_record()).unwrap()).unwrap()
    }

    #[test]
    fn test_ffi_predict_json() {
        let dir = saved_model();
        let path = c_path(&dir);
        let json = sample_json();

        unsafe {
            let result = heartrisk_predict_json(path.as_ptr(), json.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("risk_percentage"));
            heartrisk_free_string(result);
        }
    }

    #[test]
    fn test_ffi_predict_json_rejects_out_of_range() {
        let dir = saved_model();
        let path = c_path(&dir);
        let mut record = serde_json::to_value(sample_record()).unwrap();
        record["cholesterol"] = serde_json::json!(5000);
        let json = CString::new(record.to_string()).unwrap();

        unsafe {
            let result = heartrisk_predict_json(path.as_ptr(), json.as_ptr());
            assert!(result.is_null());
            let error = CStr::from_ptr(heartrisk_last_error()).to_str().unwrap();
            assert!(error.contains("cholesterol"), "{error}");
        }
    }

    #[test]
    fn test_ffi_predictor_lifecycle() {
        let dir = saved_model();
        let path = c_path(&dir);
        let json = sample_json();

        unsafe {
            let predictor = heartrisk_predictor_load(path.as_ptr());
            assert!(!predictor.is_null());

            let first = heartrisk_predictor_predict(predictor, json.as_ptr());
            let second = heartrisk_predictor_predict(predictor, json.as_ptr());
            assert!(!first.is_null() && !second.is_null());

            let a: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(first).to_str().unwrap()).unwrap();
            let b: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(second).to_str().unwrap()).unwrap();
            assert_eq!(a["prediction"], b["prediction"]);
            assert_eq!(a["producer"]["instance_id"], b["producer"]["instance_id"]);

            heartrisk_free_string(first);
            heartrisk_free_string(second);
            heartrisk_predictor_free(predictor);
        }
    }

    #[test]
    fn test_ffi_out_of_range_and_form_override() {
        let dir = saved_model();
        let path = c_path(&dir);
        let mut record = serde_json::to_value(sample_record()).unwrap();
        record["st_slope"] = serde_json::json!(0);
        let json = CString::new(record.to_string()).unwrap();

        unsafe {
            let predictor = heartrisk_predictor_load(path.as_ptr());
            let rejected = heartrisk_predictor_predict(predictor, json.as_ptr());
            assert!(rejected.is_null());
            let error = CStr::from_ptr(heartrisk_last_error()).to_str().unwrap();
            assert!(error.contains("st_slope"), "{error}");

            let mut form = FormSpec::canonical();
            for control in &mut form.controls {
                if control.field == crate::schema::Field::StSlope {
                    control.control = crate::form::Control::Options {
                        options: vec![0, 1, 2, 3],
                        default: 1,
                    };
                }
            }
            let form_json = CString::new(serde_json::to_string(&form).unwrap()).unwrap();
            assert_eq!(heartrisk_predictor_set_form(predictor, form_json.as_ptr()), 0);

            let accepted = heartrisk_predictor_predict(predictor, json.as_ptr());
            assert!(!accepted.is_null());
            heartrisk_free_string(accepted);
            heartrisk_predictor_free(predictor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let missing = CString::new("/nonexistent/heartrisk-model").unwrap();
        unsafe {
            let predictor = heartrisk_predictor_load(missing.as_ptr());
            assert!(predictor.is_null());
            let error = heartrisk_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("classifier.json"));

            let result = heartrisk_predictor_predict(ptr::null(), missing.as_ptr());
            assert!(result.is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = heartrisk_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
