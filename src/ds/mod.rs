pub mod bounded_heap;

pub use bounded_heap::{
    Admission, BoundedBottomKRetainer, BoundedRetainer, BoundedTopKRetainer, Largest, Phase,
    Retention, Smallest,
};
