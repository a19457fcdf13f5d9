//! Tiny in-memory knowledge base backing the knowledge-lookup intent.
//!
//! Keyword matching only; a real retrieval pipeline would sit behind the same
//! function signature.

/// Topic snippets keyed by the phrase that triggers them.
const KNOWLEDGE_BASE: &[(&str, &str)] = &[
    (
        "data structures",
        "Data structures are ways to organize and store data so it can be \
         accessed and modified efficiently. Common examples include arrays, \
         linked lists, stacks, queues, hash tables, trees, and graphs.",
    ),
    (
        "algorithms",
        "Algorithms are step-by-step procedures for solving a problem or \
         performing a computation. They are evaluated by their time and space \
         complexity, usually expressed in Big-O notation.",
    ),
    (
        "recursion",
        "Recursion is a technique where a function solves a problem by calling \
         itself on smaller inputs, terminating at a base case.",
    ),
    (
        "big o",
        "Big-O notation describes the upper bound of an algorithm's growth \
         rate as input size increases, abstracting away constant factors.",
    ),
    (
        "dynamic programming",
        "Dynamic programming solves problems by breaking them into overlapping \
         subproblems and caching intermediate results (memoization or \
         tabulation).",
    ),
    (
        "python basics",
        "Python is a high-level, dynamically typed programming language known \
         for readable syntax and a rich standard library, widely used for \
         scripting, data work, and backend services.",
    ),
];

/// Returns formatted context for the topics mentioned in `query`, if any.
pub fn retrieve_context(query: &str) -> Option<String> {
    let lower = query.to_lowercase();
    let mut sections = Vec::new();
    for (topic, content) in KNOWLEDGE_BASE {
        if lower.contains(topic) {
            sections.push(format!("{}: {}", topic.to_uppercase(), content));
        }
    }
    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}
