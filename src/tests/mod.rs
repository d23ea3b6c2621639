mod arith;
mod parse;
mod roll;
