use rand::RngCore;

/// Number of random bytes behind every generated token.
pub const TOKEN_BYTES: usize = 16;

fn gen_random_hex(size: usize) -> String {
    let mut rand = rand::rng();
    let mut dest = vec![0; size];

    rand.fill_bytes(&mut dest);
    hex::encode(dest)
}

/// Identifier for a newly created task.
pub fn gen_task_id() -> String {
    gen_random_hex(TOKEN_BYTES)
}

/// Correlation id for a request that arrived without one.
pub fn gen_request_id() -> String {
    gen_random_hex(TOKEN_BYTES)
}
