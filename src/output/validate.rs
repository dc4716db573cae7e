//! Final parse and validation, with one optional repair pass.

use serde_json::Value;

use super::{FinalContext, OutputStrategy, RepairFn};
use crate::error::{LlmError, NoObjectGeneratedError};

const COULD_NOT_PARSE: &str = "No object generated: could not parse the response.";
const DID_NOT_MATCH: &str = "No object generated: response did not match schema.";

fn no_object(message: &str, text: &str, cause: LlmError, ctx: &FinalContext) -> LlmError {
    NoObjectGeneratedError::new(message)
        .with_text(text)
        .with_context(ctx.response.clone(), ctx.usage.clone(), ctx.finish_reason.clone())
        .with_cause(cause)
        .into()
}

/// Strictly parse `text` and run the strategy's final validation.
///
/// Failures are wrapped in `LlmError::NoObjectGenerated` carrying the text,
/// the response context and the underlying cause.
pub fn parse_and_validate_object_result(
    text: &str,
    strategy: &dyn OutputStrategy,
    ctx: &FinalContext,
) -> Result<Value, LlmError> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        let cause = LlmError::JsonParse {
            text: text.to_string(),
            message: e.to_string(),
        };
        no_object(COULD_NOT_PARSE, text, cause, ctx)
    })?;

    strategy.validate_final(Some(&value), ctx).map_err(|e| {
        if e.is_no_object_generated() {
            e
        } else {
            no_object(DID_NOT_MATCH, text, e, ctx)
        }
    })
}

/// [`parse_and_validate_object_result`] with a single repair attempt.
///
/// The repair function is only offered parse and validation failures. If it
/// gives up, the original error is returned unchanged; otherwise the repaired
/// text is parsed and validated exactly once more and that outcome is final.
pub fn parse_and_validate_object_result_with_repair(
    text: &str,
    strategy: &dyn OutputStrategy,
    repair: Option<&RepairFn>,
    ctx: &FinalContext,
) -> Result<Value, LlmError> {
    let err = match parse_and_validate_object_result(text, strategy, ctx) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let Some(repair) = repair else {
        return Err(err);
    };
    let Some(cause) = err
        .as_no_object_generated()
        .and_then(|e| e.cause.as_deref())
        .filter(|cause| cause.is_repairable())
    else {
        return Err(err);
    };

    match repair(text, cause) {
        Some(repaired) => {
            tracing::debug!("retrying final validation with repaired text");
            parse_and_validate_object_result(&repaired, strategy, ctx)
        }
        None => {
            tracing::debug!("repair function declined to repair the response");
            Err(err)
        }
    }
}
