use super::{trigger_state, LiveResource, LoadRound, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{Billboard, Shared};
use crate::error::Result;
use crate::gamedef::{BillboardProperty, GdBillboard};
use crate::loader::ResourceType;
use crate::triggers::TriggerExpression;
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Billboard sub-object
///
/// A billboard without skin is not created. A skin path that fails to load
/// shows the error skin if the wrapper has a class.
#[derive(Debug)]
pub struct BillboardSubObject {
    base: SubObjectBase,
    descriptor: GdBillboard,
    load: LoadRound,
    skin_path: String,
    billboard: LiveResource<Billboard>,
    render_env_map: bool,
    trigger_visible: TriggerExpression,
    visible_state: bool,
}

impl BillboardSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdBillboard,
        prefix: &str,
    ) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            load: LoadRound::default(),
            skin_path: String::new(),
            billboard: LiveResource::default(),
            render_env_map: descriptor.render_env_map,
            trigger_visible: TriggerExpression::new(),
            visible_state: true,
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdBillboard {
        &self.descriptor
    }

    pub fn billboard(&self) -> Option<&Shared<Billboard>> {
        self.billboard.get()
    }

    fn update_billboard(&mut self, ctx: &mut WrapperContext) {
        let skin = self
            .load
            .get(&self.skin_path, ResourceType::Skin)
            .or_else(|| {
                (!self.skin_path.is_empty() && ctx.gd_class().is_some())
                    .then(|| ctx.environment().error_skin())
            });

        let Some(skin) = skin else {
            self.billboard.destroy(ctx, &mut self.base);
            self.base.clear_box_extents(ctx);
            return;
        };

        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let size = props.vector2(d.property_name(BillboardProperty::Size), d.size);
        let offset = props.vector2(d.property_name(BillboardProperty::Offset), d.offset);
        let center = props.vector(
            d.property_name(BillboardProperty::AttachPosition),
            d.placement.position,
        );
        self.render_env_map = props.boolean(
            d.property_name(BillboardProperty::RenderEnvMap),
            d.render_env_map,
        );

        let billboard = self.billboard.get_or_create(Billboard::default);
        {
            let mut billboard = billboard.borrow_mut();
            billboard.skin = Some(skin);
            billboard.axis = props.vector(d.property_name(BillboardProperty::Axis), d.axis);
            billboard.size = size;
            billboard.offset = offset;
            billboard.locked = props.boolean(d.property_name(BillboardProperty::Locked), d.locked);
            billboard.spherical =
                props.boolean(d.property_name(BillboardProperty::Spherical), d.spherical);
            billboard.size_fixed_to_screen = props.boolean(
                d.property_name(BillboardProperty::SizeFixedToScreen),
                d.size_fixed_to_screen,
            );
        }

        if d.do_not_scale {
            self.base.clear_box_extents(ctx);
        } else {
            let half = (size * 0.5).extend(0.0);
            let center = center + offset.extend(0.0);
            self.base.set_box_extents(ctx, center - half, center + half);
        }

        self.update_layer_masks(ctx);
        self.update_visibility(ctx);
        self.update_geometry(ctx);
        self.billboard.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.billboard.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(BillboardProperty::AttachPosition),
            "",
        );
    }
}

impl SubObject for BillboardSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::Billboard
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        let d = &self.descriptor;
        self.skin_path = self
            .base
            .props(ctx)
            .string(d.property_name(BillboardProperty::Skin), &d.skin_path);

        let load = self.load.start(&self.base, ctx);
        load.request(ctx.environment(), &self.skin_path, ResourceType::Skin);
        self.async_load_finished(ctx);
        Ok(())
    }

    fn async_load_finished(&mut self, ctx: &mut WrapperContext) {
        let Some(success) = self.load.take_completion() else {
            return;
        };
        self.update_billboard(ctx);
        ctx.finish_sub_object_load(success);
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        if let Some(billboard) = self.billboard.get() {
            billboard.borrow_mut().visible =
                self.visible_state && ctx.is_visible_with(self.descriptor.partial_hide);
        }
    }

    fn update_layer_masks(&mut self, ctx: &WrapperContext) {
        if let Some(billboard) = self.billboard.get() {
            let mut mask = ctx.render_layer_mask();
            if self.render_env_map {
                mask |= ctx.render_env_map_mask();
            }
            billboard.borrow_mut().layer_mask = mask;
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.billboard.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn init_triggers(&mut self, ctx: &WrapperContext) {
        let name = self.descriptor.property_name(BillboardProperty::Visible);
        self.base.bind_trigger(ctx, &mut self.trigger_visible, name);
    }

    fn update_triggers(&mut self, ctx: &WrapperContext) {
        self.visible_state = trigger_state(&mut self.trigger_visible, true);
        self.update_visibility(ctx);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn is_content_visible(&self) -> bool {
        self.billboard
            .get()
            .is_some_and(|billboard| billboard.borrow().skin.is_some())
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.load.cancel();
        self.trigger_visible.unlink_targets();
        self.billboard.destroy(ctx, &mut self.base);
        self.base.clear_box_extents(ctx);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_billboard(self);
    }
}
