//! Startup banner and farewell.

use crate::consts::{AUTHOR, HOMEPAGE, PRODUCT_NAME, REPO};

/// Client configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub backend: &'a str,
    pub auth_status: &'a str,
    pub timeout_secs: u64,
    pub db: &'a str,
}

pub fn banner_text(info: &BannerInfo) -> String {
    format!(
        r#"
   ╔═══════════════════════════════════════╗
   ║           F L O W D E S K             ║
   ║   {:^35} ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   backend   {}
   auth      {}
   timeout   {}s
   db        {}
"#,
        PRODUCT_NAME,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.backend,
        info.auth_status,
        info.timeout_secs,
        info.db,
    )
}

pub fn print_banner(info: &BannerInfo) {
    println!("{}", banner_text(info));
}

pub fn print_farewell() {
    println!("goodbye.");
}
