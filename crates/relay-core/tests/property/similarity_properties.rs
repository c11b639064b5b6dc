use proptest::prelude::*;
use relay_core::similarity::cosine_similarity;

fn vector(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, len)
}

fn vector_pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (1usize..64).prop_flat_map(|len| (vector(len), vector(len)))
}

proptest! {
    #[test]
    fn similarity_is_symmetric((a, b) in vector_pair()) {
        prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn similarity_is_bounded((a, b) in vector_pair()) {
        let s = cosine_similarity(&a, &b);
        prop_assert!((-1.0..=1.0).contains(&s), "similarity {} out of range", s);
    }

    #[test]
    fn self_similarity_is_one(a in (1usize..64).prop_flat_map(vector)) {
        prop_assume!(a.iter().any(|x| x.abs() > 1e-3));
        let s = cosine_similarity(&a, &a);
        prop_assert!((s - 1.0).abs() < 1e-9, "self similarity was {}", s);
    }
}
