//! 요청 본문 추출기.
//!
//! axum `Json`의 거부 응답(잘못된 JSON, Content-Type 누락 등)을
//! 다른 에러와 같은 [`ApiErrorResponse`](crate::error::ApiErrorResponse) 형식으로 돌려줍니다.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `ApiError`로 거부하는 JSON 본문 추출기.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
