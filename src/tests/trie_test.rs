use crate::index::trie::Trie;

#[test]
fn versions_are_independent() {
    let t0 = Trie::new();
    let t1 = t0.put(b"ab", 1u32);
    let t2 = t1.put(b"ac", 2u32);

    assert_eq!(t0.get::<u32>(b"ab"), None);
    assert_eq!(t1.get::<u32>(b"ac"), None);
    assert_eq!(t2.get::<u32>(b"ab"), Some(&1));
    assert_eq!(t2.get::<u32>(b"ac"), Some(&2));
}

#[test]
fn remove_preserves_old_versions() {
    let t2 = Trie::new().put(b"ab", 1u32).put(b"ac", 2u32);
    let t3 = t2.remove(b"ab");

    assert_eq!(t3.get::<u32>(b"ab"), None);
    assert_eq!(t3.get::<u32>(b"ac"), Some(&2));
    assert_eq!(t2.get::<u32>(b"ab"), Some(&1));
}

#[test]
fn empty_key_lives_on_the_root() {
    let t = Trie::new().put(b"", 42u32);
    assert_eq!(t.get::<u32>(b""), Some(&42));
    assert_eq!(t.remove(b"").get::<u32>(b""), None);
}

#[test]
fn empty_key_keeps_existing_children() {
    let t = Trie::new().put(b"x", 1u32).put(b"", 42u32);
    assert_eq!(t.get::<u32>(b""), Some(&42));
    assert_eq!(t.get::<u32>(b"x"), Some(&1));

    let t = t.remove(b"");
    assert_eq!(t.get::<u32>(b""), None);
    assert_eq!(t.get::<u32>(b"x"), Some(&1));
}

#[test]
fn type_mismatch_reads_as_absent() {
    let t = Trie::new().put(b"k", 7u32);
    assert_eq!(t.get::<String>(b"k"), None);
    assert_eq!(t.get::<u32>(b"k"), Some(&7));
}

#[test]
fn unchanged_subtrees_are_shared() {
    let t1 = Trie::new().put(b"ab", 1u32);
    let t2 = t1.put(b"ac", 2u32);

    // The "ab" terminal is off the mutated path, so both versions hand out
    // the very same value allocation.
    let before = t1.get::<u32>(b"ab").unwrap();
    let after = t2.get::<u32>(b"ab").unwrap();
    assert!(std::ptr::eq(before, after));
}

#[test]
fn overwrite_keeps_children_and_old_version() {
    let t1 = Trie::new().put(b"a", 1u32).put(b"ab", 2u32);
    let t2 = t1.put(b"a", 3u32);

    assert_eq!(t1.get::<u32>(b"a"), Some(&1));
    assert_eq!(t2.get::<u32>(b"a"), Some(&3));
    assert_eq!(t2.get::<u32>(b"ab"), Some(&2));
}

#[test]
fn remove_of_missing_key_changes_nothing() {
    let t = Trie::new().put(b"abc", 1u32);

    // "ab" exists but is an interior node, not a value node.
    let removed = t.remove(b"ab");
    assert_eq!(removed.get::<u32>(b"abc"), Some(&1));

    let removed = t.remove(b"zz");
    assert_eq!(removed.get::<u32>(b"abc"), Some(&1));
}

#[test]
fn remove_prunes_childless_interior_nodes() {
    let t = Trie::new().put(b"a", 1u32).put(b"abc", 2u32);

    let t = t.remove(b"abc");
    assert_eq!(t.get::<u32>(b"abc"), None);
    assert_eq!(t.get::<u32>(b"a"), Some(&1));

    let t = t.remove(b"a");
    assert_eq!(t.get::<u32>(b"a"), None);
}

#[test]
fn values_do_not_need_clone() {
    struct Token(String);

    let t = Trie::new().put(b"session", Token("opaque".to_string()));
    assert_eq!(t.get::<Token>(b"session").unwrap().0, "opaque");
}
