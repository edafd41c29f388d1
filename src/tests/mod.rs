mod replacer_test;
mod trie_test;
