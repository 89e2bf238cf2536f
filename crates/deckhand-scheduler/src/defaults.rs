//! Prediction job defaulting and validation

use deckhand_core::{JobSpecError, Model, PredictionJob, Quantity, ResourceRequest};

/// Fill every unset field of a resource request from the environment defaults.
///
/// Fields are defaulted independently; an explicitly set field is never
/// replaced. A zero replica count counts as unset.
pub fn apply_defaults(request: &mut ResourceRequest, defaults: &ResourceRequest) {
    if request.driver_cpu_request.is_empty() {
        request.driver_cpu_request = defaults.driver_cpu_request.clone();
    }

    if request.driver_memory_request.is_empty() {
        request.driver_memory_request = defaults.driver_memory_request.clone();
    }

    if request.executor_cpu_request.is_empty() {
        request.executor_cpu_request = defaults.executor_cpu_request.clone();
    }

    if request.executor_memory_request.is_empty() {
        request.executor_memory_request = defaults.executor_memory_request.clone();
    }

    if request.executor_replica == 0 {
        request.executor_replica = defaults.executor_replica;
    }
}

/// Validate a defaulted job, returning the first failure
pub fn validate(model: &Model, job: &PredictionJob) -> Result<(), JobSpecError> {
    if !model.model_type.supports_batch() {
        return Err(JobSpecError::UnsupportedModelType(
            model.model_type.to_string(),
        ));
    }

    let request = &job.config.resource_request;
    if request.executor_replica < 0 {
        return Err(JobSpecError::InvalidReplicaCount(request.executor_replica));
    }

    for (field, value) in request.quantities() {
        if Quantity::parse(value).is_none() {
            return Err(JobSpecError::InvalidResourceQuantity {
                field,
                value: value.to_string(),
            });
        }
    }

    Ok(())
}
