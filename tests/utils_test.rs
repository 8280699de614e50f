use spotviz::Error;
use spotviz::utils::*;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    // RFC 7636 appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        generate_code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );

    let challenge = generate_code_challenge("test_verifier_123");
    assert_ne!(challenge, generate_code_challenge("different_verifier"));
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );
}

#[test]
fn test_chunk_empty_input() {
    let items: Vec<u32> = vec![];
    assert!(chunk(&items, 100).unwrap().is_empty());
}

#[test]
fn test_chunk_exact_and_partial_batches() {
    let items: Vec<u32> = (0..250).collect();
    let sizes: Vec<usize> = chunk(&items, 100).unwrap().iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![100, 100, 50]);

    let items: Vec<u32> = (0..100).collect();
    assert_eq!(chunk(&items, 100).unwrap().len(), 1);
}

#[test]
fn test_chunk_zero_size_rejected() {
    let items = vec!["a", "b"];
    assert!(matches!(chunk(&items, 0), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_chunk_batch_count_and_concatenation() {
    for n in 0..=25usize {
        let items: Vec<usize> = (0..n).collect();
        for size in 1..=7usize {
            let batches = chunk(&items, size).unwrap();

            assert_eq!(batches.len(), n.div_ceil(size), "n={n} size={size}");
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
            if let Some((last, full)) = batches.split_last() {
                assert!(full.iter().all(|b| b.len() == size));
                assert_eq!(last.len(), n - size * full.len());
            }

            let joined: Vec<usize> = batches.concat();
            assert_eq!(joined, items, "n={n} size={size}");
        }
    }
}
