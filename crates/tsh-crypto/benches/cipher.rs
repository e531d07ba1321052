use tsh_crypto::{KdfParams, TokenCipher, TokenKey};

fn make_token(len: usize) -> String {
    (0..len)
        .map(|i| (b'a' + ((i.wrapping_mul(7) ^ (i >> 3)) % 26) as u8) as char)
        .collect()
}

fn cipher() -> TokenCipher {
    TokenCipher::from_key(TokenKey::from_bytes([0xABu8; 32]))
}

#[divan::bench(args = [64, 512, 2048])]
fn bench_encrypt_token(bencher: divan::Bencher, len: usize) {
    let cipher = cipher();
    let token = make_token(len);
    bencher
        .counter(divan::counter::BytesCount::new(len))
        .bench(|| cipher.encrypt(divan::black_box(&token)).unwrap());
}

#[divan::bench(args = [64, 512, 2048])]
fn bench_decrypt_token(bencher: divan::Bencher, len: usize) {
    let cipher = cipher();
    let envelope = cipher.encrypt(&make_token(len)).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(len))
        .bench(|| cipher.decrypt(divan::black_box(&envelope)).unwrap());
}

#[divan::bench]
fn bench_derive_default_params(bencher: divan::Bencher) {
    let secret = tsh_core::TokenSecret::new(secrecy::SecretString::from(
        "benchmark-secret-benchmark-secret-0001",
    ))
    .unwrap();
    bencher.bench(|| TokenCipher::with_params(&secret, &KdfParams::default()).unwrap());
}

fn main() {
    divan::main();
}
