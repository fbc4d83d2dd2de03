//! # Cookie 罐模块
//!
//! 服务端代用户保存源站 Cookie，使认证流程能跨请求工作。

mod jar;

pub use jar::{CookieJarStore, parse_cookie_header, parse_set_cookie_line, render_cookie_header};
