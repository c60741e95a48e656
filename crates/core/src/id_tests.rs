// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::borrow::Borrow;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId;
}

#[test]
fn define_id_new_and_as_str() {
    let id = TestId::new("abc");
    assert_eq!(id.as_str(), "abc");
}

#[test]
fn define_id_display() {
    let id = TestId::new("hello");
    assert_eq!(format!("{}", id), "hello");
    assert_eq!(id.to_string(), "hello");
}

#[test]
fn define_id_from_string() {
    let id: TestId = String::from("owned").into();
    assert_eq!(id.as_str(), "owned");
}

#[test]
fn define_id_from_str() {
    let id: TestId = "borrowed".into();
    assert_eq!(id.as_str(), "borrowed");
}

#[test]
fn define_id_short_truncates() {
    let id = TestId::new("abcdefgh");
    assert_eq!(id.short(4), "abcd");
    assert_eq!(id.short(100), "abcdefgh");
}

#[test]
fn define_id_borrow() {
    let id = TestId::new("key");
    let s: &str = id.borrow();
    assert_eq!(s, "key");
}

#[test]
fn short_id_on_str() {
    let s = "abcdefgh";
    assert_eq!(s.short(3), "abc");
    assert_eq!("ab".short(10), "ab");
}

#[test]
fn uuid_id_gen_produces_unique_ids() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}

#[test]
fn sequential_id_gen_increments() {
    let gen = SequentialIdGen::new("task");
    assert_eq!(gen.next(), "task-1");
    assert_eq!(gen.next(), "task-2");
    assert_eq!(gen.next(), "task-3");
}
