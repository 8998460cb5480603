//! Integration tests for the component lifecycle pipeline

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use vela_ecs::{
    ComponentDef, ComponentEventKind, ComponentRegistry, EcsError, HookContext, HookResult, Mixin,
    Scene, SchemaRegistry,
};
use vela_schema::{DataDiff, ParsedData, PropertyDescriptor, Schema, SchemaError};

/// Records every hook invocation for assertions
#[derive(Default)]
struct Calls {
    inits: u32,
    updates: u32,
    removes: u32,
    ticks: Vec<String>,
    last_old: Option<ParsedData>,
    last_diff: Option<DataDiff>,
}

struct Probe {
    name: String,
    schema: Schema,
    calls: Rc<RefCell<Calls>>,
}

impl ComponentDef for Probe {
    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn init(&mut self, _ctx: &mut HookContext, _data: &ParsedData) -> HookResult {
        self.calls.borrow_mut().inits += 1;
        Ok(())
    }

    fn update(
        &mut self,
        _ctx: &mut HookContext,
        _data: &ParsedData,
        old_data: &ParsedData,
        diff: &DataDiff,
    ) -> HookResult {
        let mut calls = self.calls.borrow_mut();
        calls.updates += 1;
        calls.last_old = Some(old_data.clone());
        calls.last_diff = Some(diff.clone());
        Ok(())
    }

    fn remove(&mut self, _ctx: &mut HookContext, _data: &ParsedData) -> HookResult {
        self.calls.borrow_mut().removes += 1;
        Ok(())
    }

    fn tick(&mut self, _ctx: &mut HookContext, _data: &ParsedData, _time: f64, _delta: f64) {
        self.calls.borrow_mut().ticks.push(self.name.clone());
    }
}

/// Geometry-style component whose schema follows its `primitive` property
struct ShapeProbe {
    variants: Rc<SchemaRegistry>,
    calls: Rc<RefCell<Calls>>,
}

impl ComponentDef for ShapeProbe {
    fn schema(&self) -> Schema {
        Schema::new().property(
            "primitive",
            PropertyDescriptor::string("box").one_of(&["box", "sphere"]),
        )
    }

    fn update_schema(&self, data: &ParsedData) -> Option<Schema> {
        let primitive = data.get("primitive")?.as_str()?;
        let variant = self.variants.get(primitive)?;
        Some(self.schema().extend(variant))
    }

    fn update(
        &mut self,
        _ctx: &mut HookContext,
        _data: &ParsedData,
        old_data: &ParsedData,
        diff: &DataDiff,
    ) -> HookResult {
        let mut calls = self.calls.borrow_mut();
        calls.updates += 1;
        calls.last_old = Some(old_data.clone());
        calls.last_diff = Some(diff.clone());
        Ok(())
    }
}

fn size_schema() -> Schema {
    Schema::new().property("size", PropertyDescriptor::number(1.0))
}

fn material_schema() -> Schema {
    Schema::new()
        .property("color", PropertyDescriptor::string("white"))
        .property("opacity", PropertyDescriptor::number(1.0).range(0.0, 1.0))
}

fn probe_scene(name: &str, schema: Schema) -> (Scene, Rc<RefCell<Calls>>) {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut registry = ComponentRegistry::new();
    let factory_calls = calls.clone();
    let factory_name = name.to_string();
    registry.register(name, move || {
        Box::new(Probe {
            name: factory_name.clone(),
            schema: schema.clone(),
            calls: factory_calls.clone(),
        })
    });
    (Scene::new(registry), calls)
}

fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_init_once_and_no_update_on_unchanged_value() {
    let (mut scene, calls) = probe_scene("resize", size_schema());
    let entity = scene.create_entity();

    scene.set_data(entity, "resize", pairs(&[("size", "5")])).unwrap();
    scene.set_data(entity, "resize", pairs(&[("size", "5")])).unwrap();

    assert_eq!(calls.borrow().inits, 1);
    assert_eq!(calls.borrow().updates, 0);
    let data = scene.get_data(entity, "resize").unwrap();
    assert_eq!(data.get("size").unwrap().as_number(), Some(5.0));
}

#[test]
fn test_update_receives_previous_data_and_diff() {
    let (mut scene, calls) = probe_scene("resize", size_schema());
    let entity = scene.create_entity();

    scene.set_data(entity, "resize", pairs(&[("size", "5")])).unwrap();
    scene.set_data(entity, "resize", pairs(&[("size", "7")])).unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.updates, 1);
    let old = calls.last_old.as_ref().unwrap();
    assert_eq!(old.get("size").unwrap().as_number(), Some(5.0));
    let diff = calls.last_diff.as_ref().unwrap();
    assert!(diff.contains("size"));
    assert_eq!(diff.len(), 1);
}

#[test]
fn test_dynamic_schema_swap_box_to_sphere() {
    let mut variants = SchemaRegistry::new();
    variants.register(
        "box",
        Schema::new()
            .property("width", PropertyDescriptor::number(1.0))
            .property("height", PropertyDescriptor::number(1.0))
            .property("depth", PropertyDescriptor::number(1.0)),
    );
    variants.register(
        "sphere",
        Schema::new().property("radius", PropertyDescriptor::number(1.0)),
    );
    let variants = Rc::new(variants);

    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut registry = ComponentRegistry::new();
    let factory_variants = variants.clone();
    let factory_calls = calls.clone();
    registry.register("shape", move || {
        Box::new(ShapeProbe {
            variants: factory_variants.clone(),
            calls: factory_calls.clone(),
        })
    });

    let mut scene = Scene::new(registry);
    let entity = scene.create_entity();

    scene
        .set_data(entity, "shape", "primitive: box; width: 2")
        .unwrap();
    {
        let data = scene.get_data(entity, "shape").unwrap();
        assert_eq!(data.get("width").unwrap().as_number(), Some(2.0));
        assert!(data.contains("depth"));
        assert!(!data.contains("radius"));
    }

    scene
        .set_data(entity, "shape", pairs(&[("primitive", "sphere")]))
        .unwrap();
    let data = scene.get_data(entity, "shape").unwrap();
    assert!(!data.contains("width"));
    assert!(!data.contains("height"));
    assert!(!data.contains("depth"));
    assert_eq!(data.get("radius").unwrap().as_number(), Some(1.0));

    // The diff carries the dropped box properties as synthetic removals
    // and the introduced sphere property as a synthetic addition.
    let calls = calls.borrow();
    let diff = calls.last_diff.as_ref().unwrap();
    for name in ["width", "height", "depth", "radius", "primitive"] {
        assert!(diff.contains(name), "diff missing `{}`", name);
    }
    let radius = diff.get("radius").unwrap();
    assert!(radius.old.is_none());
    let width = diff.get("width").unwrap();
    assert!(width.new.is_none());
}

#[test]
fn test_removed_component_is_not_resurrected() {
    let (mut scene, calls) = probe_scene("resize", size_schema());
    let entity = scene.create_entity();

    scene.set_data(entity, "resize", pairs(&[("size", "5")])).unwrap();
    scene.remove_component(entity, "resize").unwrap();

    assert_eq!(calls.borrow().removes, 1);
    assert!(scene.get_data(entity, "resize").is_none());

    // Re-adding creates a fresh instance with default data, not a
    // resurrection carrying the old explicit value.
    scene.set_data(entity, "resize", "").unwrap();
    assert_eq!(calls.borrow().inits, 2);
    let data = scene.get_data(entity, "resize").unwrap();
    assert_eq!(data.get("size").unwrap().as_number(), Some(1.0));
}

#[test]
fn test_mixin_precedence() {
    let (mut scene, _calls) = probe_scene("material", material_schema());

    let mut base = Mixin::new("base");
    base.set_attribute("material", "color: red; opacity: 0.9");
    scene.define_mixin(base).unwrap();

    let mut faded = Mixin::new("faded");
    faded.set_attribute("material", "color: blue; opacity: 0.5");
    scene.define_mixin(faded).unwrap();

    let entity = scene.create_entity();
    scene
        .set_mixins(entity, vec!["base".to_string(), "faded".to_string()])
        .unwrap();

    // Later mixins override earlier ones.
    {
        let data = scene.get_data(entity, "material").unwrap();
        assert_eq!(data.get("color").unwrap().as_str(), Some("blue"));
        assert_eq!(data.get("opacity").unwrap().as_number(), Some(0.5));
    }

    // The entity's own explicit attribute wins over all mixins.
    scene
        .set_data(entity, "material", pairs(&[("color", "green")]))
        .unwrap();
    let data = scene.get_data(entity, "material").unwrap();
    assert_eq!(data.get("color").unwrap().as_str(), Some("green"));
    assert_eq!(data.get("opacity").unwrap().as_number(), Some(0.5));
}

#[test]
fn test_mixin_change_propagates_to_entities() {
    let (mut scene, calls) = probe_scene("material", material_schema());

    let mut glass = Mixin::new("glass");
    glass.set_attribute("material", "opacity: 0.3");
    scene.define_mixin(glass).unwrap();

    let entity = scene.create_entity();
    scene.set_mixins(entity, vec!["glass".to_string()]).unwrap();
    assert_eq!(
        scene
            .get_data(entity, "material")
            .unwrap()
            .get("opacity")
            .unwrap()
            .as_number(),
        Some(0.3)
    );

    let updates_before = calls.borrow().updates;
    scene
        .set_mixin_attribute("glass", "material", "opacity: 0.8")
        .unwrap();

    assert!(calls.borrow().updates > updates_before);
    assert_eq!(
        scene
            .get_data(entity, "material")
            .unwrap()
            .get("opacity")
            .unwrap()
            .as_number(),
        Some(0.8)
    );
}

#[test]
fn test_lifecycle_events_are_emitted() {
    let (mut scene, _calls) = probe_scene("resize", size_schema());
    let entity = scene.create_entity();

    let seen: Rc<RefCell<Vec<(ComponentEventKind, Vec<String>)>>> =
        Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    scene
        .entity_mut(entity)
        .unwrap()
        .events()
        .subscribe(move |event| {
            sink.borrow_mut().push((event.kind, event.changed.clone()));
        });

    scene.set_data(entity, "resize", pairs(&[("size", "5")])).unwrap();
    scene.set_data(entity, "resize", pairs(&[("size", "6")])).unwrap();
    scene.remove_component(entity, "resize").unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].0, ComponentEventKind::Initialized);
    assert_eq!(seen[1].0, ComponentEventKind::Changed);
    assert_eq!(seen[1].1, vec!["size".to_string()]);
    assert_eq!(seen[2].0, ComponentEventKind::Removed);
}

#[test]
fn test_init_failure_is_fatal_for_the_instance() {
    struct FailingInit;

    impl ComponentDef for FailingInit {
        fn schema(&self) -> Schema {
            Schema::new()
        }

        fn init(&mut self, _ctx: &mut HookContext, _data: &ParsedData) -> HookResult {
            Err("backend unavailable".into())
        }
    }

    let mut registry = ComponentRegistry::new();
    registry.register("broken", || Box::new(FailingInit));
    let mut scene = Scene::new(registry);
    let entity = scene.create_entity();

    let result = scene.set_data(entity, "broken", "");
    assert!(matches!(
        result,
        Err(EcsError::Lifecycle { phase: "init", .. })
    ));
    assert!(scene.entity(entity).unwrap().component("broken").is_none());
}

#[test]
fn test_strict_mode_rejects_unknown_properties() {
    let (mut scene, _calls) = probe_scene("resize", size_schema());
    let entity = scene.create_entity();

    scene.set_data(entity, "resize", pairs(&[("size", "5")])).unwrap();
    let result = scene.set_data_strict(entity, "resize", pairs(&[("huge", "yes")]));
    assert!(matches!(
        result,
        Err(EcsError::Schema(SchemaError::UnknownProperty(_)))
    ));

    // Prior data is left untouched by the failed mutation.
    let data = scene.get_data(entity, "resize").unwrap();
    assert_eq!(data.get("size").unwrap().as_number(), Some(5.0));
}

#[test]
fn test_schema_error_leaves_prior_data() {
    let (mut scene, calls) = probe_scene("resize", size_schema());
    let entity = scene.create_entity();

    scene.set_data(entity, "resize", pairs(&[("size", "5")])).unwrap();
    let result = scene.set_data(entity, "resize", pairs(&[("size", "big")]));
    assert!(matches!(result, Err(EcsError::Schema(_))));

    let data = scene.get_data(entity, "resize").unwrap();
    assert_eq!(data.get("size").unwrap().as_number(), Some(5.0));
    assert_eq!(calls.borrow().updates, 0);
}

#[test]
fn test_tick_runs_in_registration_order() {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut registry = ComponentRegistry::new();
    for name in ["alpha", "beta"] {
        let factory_calls = calls.clone();
        let factory_name = name.to_string();
        registry.register(name, move || {
            Box::new(Probe {
                name: factory_name.clone(),
                schema: Schema::new(),
                calls: factory_calls.clone(),
            })
        });
    }

    let mut scene = Scene::new(registry);
    let entity = scene.create_entity();
    // Register beta first to show order follows attachment, not names.
    scene.set_data(entity, "beta", "").unwrap();
    scene.set_data(entity, "alpha", "").unwrap();

    scene.tick(16.0, 16.0);
    scene.tick(32.0, 16.0);

    assert_eq!(
        calls.borrow().ticks,
        vec!["beta", "alpha", "beta", "alpha"]
    );
}

#[test]
fn test_entity_destroy_removes_all_components() {
    let (mut scene, calls) = probe_scene("resize", size_schema());
    let entity = scene.create_entity();
    scene.set_data(entity, "resize", "").unwrap();

    scene.remove_entity(entity).unwrap();
    assert_eq!(calls.borrow().removes, 1);
    assert!(scene.entity(entity).is_none());
    assert_eq!(scene.entity_count(), 0);
}
