//! Build date and time for `ivetool version`.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=IVE_BUILD_DATE");
    println!("cargo:rerun-if-env-changed=IVE_BUILD_TIME");

    let now = time::OffsetDateTime::now_utc();
    let stamp = |var: &str, fmt: &str| {
        std::env::var(var).unwrap_or_else(|_| {
            time::format_description::parse_borrowed::<1>(fmt)
                .ok()
                .and_then(|f| now.format(&f).ok())
                .unwrap_or_else(|| "unknown".to_string())
        })
    };

    let date = stamp("IVE_BUILD_DATE", "[year]-[month]-[day]");
    let time = stamp("IVE_BUILD_TIME", "[hour]:[minute]:[second]");
    println!("cargo:rustc-env=IVE_BUILD_DATE={date}");
    println!("cargo:rustc-env=IVE_BUILD_TIME={time}");
}
