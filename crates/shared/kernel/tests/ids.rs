use rollcall_kernel::{SAFE_ALPHABET, safe_nanoid};

#[test]
fn record_keys_use_the_unambiguous_alphabet() {
    let id = safe_nanoid!();
    assert_eq!(id.len(), 12);
    assert!(id.chars().all(|ch| SAFE_ALPHABET.contains(&ch)), "unexpected character in {id}");
    assert!(!id.contains(['0', 'O', '1', 'l', 'I']));
}

#[test]
fn record_keys_accept_a_length_and_do_not_repeat() {
    let first = safe_nanoid!(20);
    let second = safe_nanoid!(20);
    assert_eq!(first.len(), 20);
    assert_ne!(first, second);
}
