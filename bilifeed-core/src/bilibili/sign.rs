//! App-API request signing
//!
//! The app endpoints authenticate queries with `appkey`, `ts` and a `sign`
//! computed as `md5(sorted_query + app_secret)`. The signature depends only
//! on the parameter set, the timestamp and the credentials, never on
//! insertion order.

use std::collections::HashMap;

/// Long-lived app credential pair used to sign API queries
#[derive(Debug, Clone)]
pub struct AppCredentials {
    pub key: String,
    pub secret: String,
}

impl AppCredentials {
    #[must_use]
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// Add `appkey`, `ts` and `sign` to the params.
///
/// Algorithm: set appkey and ts, sort parameter names lexicographically,
/// form-urlencode `name=value` pairs joined with `&` (the same encoding the
/// upstream applies when verifying), then `sign = md5(query + secret)` in
/// lowercase hex. Takes the timestamp as an argument so the result is a pure
/// function of its inputs; use [`sign_now`] for wall-clock signing.
pub fn sign(params: &mut HashMap<String, String>, credentials: &AppCredentials, ts: i64) {
    params.insert("appkey".to_string(), credentials.key.clone());
    params.insert("ts".to_string(), ts.to_string());

    let mut names: Vec<String> = params.keys().cloned().collect();
    names.sort_unstable();

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for name in &names {
        serializer.append_pair(name, &params[name]);
    }
    let canonical = serializer.finish();

    let digest = md5::compute(format!("{canonical}{}", credentials.secret));
    params.insert("sign".to_string(), format!("{digest:x}"));
}

/// Sign with the current unix time
pub fn sign_now(params: &mut HashMap<String, String>, credentials: &AppCredentials) {
    sign(params, credentials, chrono::Utc::now().timestamp());
}
