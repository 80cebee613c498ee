//! Built-in example snippets offered by the editor

/// A ready-to-run snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    pub title: &'static str,
    pub description: &'static str,
    pub code: &'static str,
}

pub const EXAMPLES: &[Example] = &[
    Example {
        title: "Variables",
        description: "Learn about data types",
        code: r#"# Variables and Data Types
name = "Alice"
age = 25
height = 5.6
is_student = True

print(f"Name: {name}")
print(f"Age: {age}")
print(f"Height: {height}m")
print(f"Student: {is_student}")"#,
    },
    Example {
        title: "For Loop",
        description: "Iterate through numbers",
        code: r#"# For Loop Example
for i in range(5):
    print(f"Count: {i}")

# Loop through a list
fruits = ["apple", "banana", "cherry"]
for fruit in fruits:
    print(f"I like {fruit}")"#,
    },
    Example {
        title: "Functions",
        description: "Create reusable code",
        code: r#"# Function Example
def greet(name):
    return f"Hello, {name}!"

def add(a, b):
    return a + b

print(greet("Alice"))
print(f"5 + 3 = {add(5, 3)}")"#,
    },
    Example {
        title: "Lists",
        description: "Work with collections",
        code: r#"# List Operations
numbers = [1, 2, 3, 4, 5]
print(f"Original: {numbers}")

numbers.append(6)
print(f"After append: {numbers}")

numbers.remove(3)
print(f"After remove: {numbers}")

print(f"First item: {numbers[0]}")
print(f"Last item: {numbers[-1]}")"#,
    },
];

/// Look up an example by position
pub fn get(index: usize) -> Option<&'static Example> {
    EXAMPLES.get(index)
}
