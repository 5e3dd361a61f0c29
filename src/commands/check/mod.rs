mod engine;
mod run;
mod table3;
mod table4;
mod text;


pub use run::run;
