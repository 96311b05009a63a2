//! Generates Swift and Kotlin bindings for the mealdb-kit library.
//!
//! ```bash
//! cargo build --release
//! cargo run --features cli --bin uniffi-bindgen generate \
//!     --library target/release/libmealdb_kit.so --language swift --out-dir ./bindings
//! cargo run --features cli --bin uniffi-bindgen generate \
//!     --library target/release/libmealdb_kit.so --language kotlin --out-dir ./bindings
//! ```

fn main() {
    uniffi::uniffi_bindgen_main()
}
