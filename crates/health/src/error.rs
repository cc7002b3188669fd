use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Health weights reference unknown metric '{0}'")]
    UnknownMetric(String),
}
