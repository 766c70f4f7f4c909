use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RoutingError {
    #[snafu(display("tab rule pattern '{pattern}' is invalid on `{stage}`: {reason}"))]
    InvalidPattern {
        stage: &'static str,
        pattern: String,
        reason: String,
    },
    #[snafu(display("{entity} '{name}' was not found on `{stage}`"))]
    NotFound {
        stage: &'static str,
        entity: &'static str,
        name: String,
    },
}

pub type RoutingResult<T> = Result<T, RoutingError>;
