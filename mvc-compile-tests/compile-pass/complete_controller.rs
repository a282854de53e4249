use mvc_core::prelude::*;

#[derive(Default)]
pub struct Items {
    name: String,
}

impl Items {
    fn get(&mut self, ctx: &mut Context) {
        ctx.write(format!("items from {}", self.name));
    }

    fn delete_by(&mut self, _ctx: &mut Context) {}
}

impl BaseController for Items {
    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
    fn begin_request(&mut self, _ctx: &mut Context) {}
    fn end_request(&mut self, _ctx: &mut Context) {}
}

impl Controller for Items {
    fn routes() -> Vec<Route<Self>> {
        vec![
            Route::named("get", Items::get),
            Route::named("delete_by", Items::delete_by),
        ]
    }
}

fn main() {
    let _ = Template::new(Items::default());
}
