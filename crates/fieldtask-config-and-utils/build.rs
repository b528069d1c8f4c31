fn main() {
    // Tell cargo to recompile when these compile-time env vars change.
    // Without this, option_env!() values get cached and won't update.
    println!("cargo:rerun-if-env-changed=AMAZON_COGNITO_REGION");
    println!("cargo:rerun-if-env-changed=AMAZON_COGNITO_IDENTITY_POOL_ID");
    println!("cargo:rerun-if-env-changed=AMAZON_DYNAMODB_REGION");
}
