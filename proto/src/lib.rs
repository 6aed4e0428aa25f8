pub mod tern {
    include!("tern.v1.rs");
}
