//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (flush_delay_ms / max_buffer_size / max_concurrency >= 1)
//! - elasticsearch 后端的 endpoint 必须是 http(s) URL
//! - index_prefix 符合索引命名规则
//! - user / password 成对出现

use ::validator::Validate;
use contracts::{BackendConfig, BackendKind, ContractError, ExporterConfig};
use url::Url;

/// Characters Elasticsearch rejects in index names
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// 校验 ExporterConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &ExporterConfig) -> Result<(), ContractError> {
    validate_fields("sink", &config.sink)?;
    validate_fields("backend", &config.backend)?;
    validate_endpoint(&config.backend)?;
    validate_index_prefix(&config.backend)?;
    validate_credentials(&config.backend)?;
    Ok(())
}

/// 校验派生的字段规则，报告字母序最前的字段
fn validate_fields<T: Validate>(section: &str, value: &T) -> Result<(), ContractError> {
    let Err(errors) = value.validate() else {
        return Ok(());
    };

    let first = errors
        .field_errors()
        .into_iter()
        .min_by(|(a, _), (b, _)| a.cmp(b));

    Err(match first {
        Some((field, field_errors)) => {
            let message = field_errors
                .first()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .unwrap_or_else(|| "invalid value".to_string());
            ContractError::config_validation(format!("{section}.{field}"), message)
        }
        None => ContractError::config_validation(section, errors.to_string()),
    })
}

/// 校验后端地址
fn validate_endpoint(backend: &BackendConfig) -> Result<(), ContractError> {
    if backend.kind != BackendKind::Elasticsearch {
        return Ok(());
    }

    let invalid = |reason: String| {
        ContractError::config_validation("backend.endpoint", format!("'{}' {reason}", backend.endpoint))
    };

    let url = Url::parse(&backend.endpoint).map_err(|e| invalid(format!("is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("must use http:// or https://".into()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("has no host".into()));
    }
    // `_bulk` is appended to the endpoint as-is
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".into()));
    }
    Ok(())
}

/// 校验索引前缀
fn validate_index_prefix(backend: &BackendConfig) -> Result<(), ContractError> {
    let prefix = &backend.index_prefix;
    if prefix.chars().any(|c| c.is_uppercase()) {
        return Err(ContractError::config_validation(
            "backend.index_prefix",
            format!("'{prefix}' must be lowercase"),
        ));
    }
    if let Some(c) = prefix.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(ContractError::config_validation(
            "backend.index_prefix",
            format!("'{prefix}' contains forbidden character '{c}'"),
        ));
    }
    if prefix.starts_with(['-', '_', '+']) {
        return Err(ContractError::config_validation(
            "backend.index_prefix",
            format!("'{prefix}' cannot start with '-', '_' or '+'"),
        ));
    }
    Ok(())
}

/// 校验凭据成对出现
fn validate_credentials(backend: &BackendConfig) -> Result<(), ContractError> {
    if backend.user.is_empty() != backend.password.is_empty() {
        return Err(ContractError::config_validation(
            "backend.user",
            "user and password must be set together",
        ));
    }
    Ok(())
}
