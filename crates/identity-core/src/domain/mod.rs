//! 아이덴티티/역할 관리를 위한 도메인 모델.

mod claims;
mod identity;
mod role;

pub use claims::*;
pub use identity::*;
pub use role::*;
