//! The library code for the `webgen` static site generator. A site is an
//! ordinary directory tree; any folder with a source marker directory
//! (`__src` or `.__src`) gets its `.md` and `.content` files rendered, and any
//! source marker with a posts marker (`POSTS`) inside it gets its dated post
//! folders published. The build runs as three passes over the tree
//! ([`build::PIPELINE`]):
//!
//! 1. Aggregating posts ([`crate::post`]): read every post's front matter,
//!    sort the posts newest first, rebuild the published `post/` tree and
//!    render a summary into `__src/index.content`.
//! 2. Rendering Markdown ([`crate::render`]): `__src/name.md` becomes
//!    `__src/name.content`, wrapped in the nearest `MARKDOWN.template`.
//! 3. Rendering content ([`crate::render`]): `__src/name.content` becomes
//!    `name.html`, pushed through a chain of templates resolved by climbing
//!    the tree ([`crate::resolve`]): every `SUB.template` met on the way up,
//!    then the first `CONTENT.template`.
//!
//! Each pass consumes files the previous one wrote, which is why the order
//! is fixed.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod markdown;
pub mod metadata;
pub mod post;
pub mod render;
pub mod report;
pub mod resolve;
pub mod template;
pub mod value;
pub mod walk;
mod util;
