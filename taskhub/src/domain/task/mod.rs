mod model;

pub use model::{MAX_TITLE_LEN, Task};
