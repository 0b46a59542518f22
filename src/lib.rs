#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_codec as codec;
pub use vc_ptr as ptr;

pub use vc_codec::{Readonly, impl_member_type, schema, submit_formatter};
