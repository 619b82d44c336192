//! API 서버용 HTTP middleware.
//!
//! 요청 처리 파이프라인에 적용되는 공통 middleware 모듈.
//! 인증 가드는 [`crate::auth`]에 있습니다.

mod metrics;

pub use metrics::metrics_layer;
