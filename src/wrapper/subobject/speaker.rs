use super::{trigger_state, LiveResource, LoadRound, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{Shared, Speaker};
use crate::error::Result;
use crate::gamedef::{GdSpeaker, SpeakerProperty};
use crate::loader::ResourceType;
use crate::triggers::TriggerExpression;
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Speaker sub-object. Playback and muting follow trigger expressions, a
/// hidden wrapper mutes the speaker.
#[derive(Debug)]
pub struct SpeakerSubObject {
    base: SubObjectBase,
    descriptor: GdSpeaker,
    load: LoadRound,
    sound_path: String,
    speaker: LiveResource<Speaker>,
    trigger_playing: TriggerExpression,
    trigger_muted: TriggerExpression,
    playing: bool,
    muted: bool,
}

impl SpeakerSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdSpeaker,
        prefix: &str,
    ) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            load: LoadRound::default(),
            sound_path: String::new(),
            speaker: LiveResource::default(),
            trigger_playing: TriggerExpression::new(),
            trigger_muted: TriggerExpression::new(),
            playing: descriptor.playing,
            muted: descriptor.muted,
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdSpeaker {
        &self.descriptor
    }

    pub fn speaker(&self) -> Option<&Shared<Speaker>> {
        self.speaker.get()
    }

    fn create_speaker(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let sound = self.load.get(&self.sound_path, ResourceType::Sound);
        let speaker = self.speaker.get_or_create(Speaker::default);
        {
            let mut speaker = speaker.borrow_mut();
            speaker.sound = sound;
            speaker.looping = props.boolean(d.property_name(SpeakerProperty::Looping), d.looping);
            speaker.volume = props.float(d.property_name(SpeakerProperty::Volume), d.volume);
            speaker.range = props.float(d.property_name(SpeakerProperty::Range), d.range);
            speaker.roll_off = props.float(d.property_name(SpeakerProperty::RollOff), d.roll_off);
            speaker.play_speed =
                props.float(d.property_name(SpeakerProperty::PlaySpeed), d.play_speed);
        }

        self.update_layer_masks(ctx);
        self.update_visibility(ctx);
        self.update_geometry(ctx);
        self.speaker.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.speaker.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(SpeakerProperty::AttachPosition),
            d.property_name(SpeakerProperty::AttachRotation),
        );
    }
}

impl SubObject for SpeakerSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::Speaker
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        let d = &self.descriptor;
        self.sound_path = self
            .base
            .props(ctx)
            .string(d.property_name(SpeakerProperty::Sound), &d.sound_path);

        let load = self.load.start(&self.base, ctx);
        load.request(ctx.environment(), &self.sound_path, ResourceType::Sound);
        self.async_load_finished(ctx);
        Ok(())
    }

    fn async_load_finished(&mut self, ctx: &mut WrapperContext) {
        let Some(success) = self.load.take_completion() else {
            return;
        };
        self.create_speaker(ctx);
        ctx.finish_sub_object_load(success);
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        if let Some(speaker) = self.speaker.get() {
            let mut speaker = speaker.borrow_mut();
            speaker.playing = self.playing;
            speaker.muted = self.muted || !ctx.is_visible_with(false);
        }
    }

    fn update_layer_masks(&mut self, ctx: &WrapperContext) {
        if let Some(speaker) = self.speaker.get() {
            speaker.borrow_mut().layer_mask = ctx.audio_layer_mask();
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.speaker.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn init_triggers(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.base
            .bind_trigger(ctx, &mut self.trigger_playing, d.property_name(SpeakerProperty::Playing));
        self.base
            .bind_trigger(ctx, &mut self.trigger_muted, d.property_name(SpeakerProperty::Muted));
    }

    fn update_triggers(&mut self, ctx: &WrapperContext) {
        self.playing = trigger_state(&mut self.trigger_playing, self.descriptor.playing);
        self.muted = trigger_state(&mut self.trigger_muted, self.descriptor.muted);
        self.update_visibility(ctx);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.load.cancel();
        self.trigger_playing.unlink_targets();
        self.trigger_muted.unlink_targets();
        self.speaker.destroy(ctx, &mut self.base);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_speaker(self);
    }
}
