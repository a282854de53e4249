use mvc_core::prelude::*;

#[derive(Default)]
pub struct Orphan;

impl Orphan {
    fn get(&mut self, ctx: &mut Context) {
        ctx.write("orphan");
    }
}

impl Controller for Orphan {
    fn routes() -> Vec<Route<Self>> {
        vec![Route::named("get", Orphan::get)]
    }
}

fn main() {}
