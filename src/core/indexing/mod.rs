pub mod kdmap;
