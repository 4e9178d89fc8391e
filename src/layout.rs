// src/layout.rs
// Declarative descriptions of the portfolio's physical objects.
// Plain data only; `lifecycle::spawn_object` turns a descriptor into a
// scene object + registered body.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::body::{BodyMaterial, ShapeParams};
use crate::config::{BrickWallConfig, GameplayConfig};
use crate::scene::Pose;

/// Ground slab dimensions (full size).
pub const GROUND_SIZE: Vec3 = Vec3::new(175.0, 0.5, 175.0);
/// Boundary wall offset from the origin along x / z.
pub const BOUNDARY_OFFSET: f32 = 87.5;
pub const BOUNDARY_WALL_HEIGHT: f32 = 3.5;
pub const BOUNDARY_WALL_THICKNESS: f32 = 0.5;
pub const LINK_BOX_SIZE: Vec3 = Vec3::new(4.0, 4.0, 1.0);
pub const BEACH_BALL_RESTITUTION: f32 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub name: String,
    #[serde(default)]
    pub pose: Pose,
    pub shape: ShapeParams,
    /// 0 = static.
    #[serde(default)]
    pub mass: f32,
    #[serde(default)]
    pub material: BodyMaterial,
}

impl ObjectDescriptor {
    pub fn new(name: impl Into<String>, pose: Pose, shape: ShapeParams, mass: f32) -> Self {
        Self {
            name: name.into(),
            pose,
            shape,
            mass,
            material: BodyMaterial::default(),
        }
    }

    pub fn with_material(mut self, material: BodyMaterial) -> Self {
        self.material = material;
        self
    }
}

/// Static grid plane (the ground slab) whose top face sits at y = 0.
pub fn grid_plane() -> ObjectDescriptor {
    ObjectDescriptor::new(
        "grid_plane",
        Pose::from_position(Vec3::new(0.0, -GROUND_SIZE.y * 0.5, 0.0)),
        ShapeParams::cuboid(GROUND_SIZE),
        0.0,
    )
    .with_material(BodyMaterial::default().with_friction(10.0).with_rolling_friction(10.0))
}

/// The four static walls enclosing the ground.
pub fn boundary_walls() -> Vec<ObjectDescriptor> {
    let y = BOUNDARY_WALL_HEIGHT * 0.5;
    let along_z = Vec3::new(BOUNDARY_WALL_THICKNESS, BOUNDARY_WALL_HEIGHT, GROUND_SIZE.z);
    let along_x = Vec3::new(GROUND_SIZE.x, BOUNDARY_WALL_HEIGHT, BOUNDARY_WALL_THICKNESS);
    [
        ("wall_east", Vec3::new(BOUNDARY_OFFSET, y, 0.0), along_z),
        ("wall_west", Vec3::new(-BOUNDARY_OFFSET, y, 0.0), along_z),
        ("wall_south", Vec3::new(0.0, y, BOUNDARY_OFFSET), along_x),
        ("wall_north", Vec3::new(0.0, y, -BOUNDARY_OFFSET), along_x),
    ]
    .into_iter()
    .map(|(name, pos, size)| {
        ObjectDescriptor::new(name, Pose::from_position(pos), ShapeParams::cuboid(size), 0.0)
    })
    .collect()
}

/// The player-controlled ball at its spawn pose.
pub fn player_ball(gameplay: &GameplayConfig) -> ObjectDescriptor {
    let ball = &gameplay.ball;
    ObjectDescriptor::new(
        "ball",
        ball.spawn,
        ShapeParams::sphere(ball.radius),
        ball.mass,
    )
    .with_material(BodyMaterial::default().with_rolling_friction(ball.rolling_friction))
}

/// Heavy, bouncy ball dropped into the scene at start-up.
pub fn beach_ball() -> ObjectDescriptor {
    ObjectDescriptor::new(
        "beach_ball",
        Pose::from_position(Vec3::new(20.0, 30.0, 0.0)),
        ShapeParams::sphere(2.0),
        20.0,
    )
    .with_material(
        BodyMaterial::default()
            .with_rolling_friction(1.0)
            .with_restitution(BEACH_BALL_RESTITUTION),
    )
}

/// Billboards: a static pole each, plus the sign on the vertical one.
pub fn billboards() -> Vec<ObjectDescriptor> {
    let mut objects = Vec::new();
    for (name, pos, turns, vertical) in [
        ("billboard_terp", Vec3::new(-80.0, 2.5, -70.0), 0.22, false),
        ("billboard_bagholder", Vec3::new(-45.0, 2.5, -78.0), 0.17, false),
        ("billboard_home", Vec3::new(-17.0, 1.25, -75.0), 0.15, true),
    ] {
        let rotation = Quat::from_rotation_y(std::f32::consts::PI * turns);
        let (pole, sign, sign_offset) = if vertical {
            (Vec3::new(1.0, 2.5, 1.0), Vec3::new(15.0, 20.0, 1.0), 11.25)
        } else {
            (Vec3::new(1.0, 5.0, 1.0), Vec3::new(30.0, 15.0, 1.0), 10.0)
        };
        objects.push(ObjectDescriptor::new(
            format!("{name}_pole"),
            Pose::new(pos, rotation),
            ShapeParams::cuboid(pole),
            0.0,
        ));
        // Horizontal signs hang out of reach and carry no body.
        if vertical {
            objects.push(ObjectDescriptor::new(
                format!("{name}_sign"),
                Pose::new(pos + Vec3::Y * sign_offset, rotation),
                ShapeParams::cuboid(sign),
                0.0,
            ));
        }
    }
    objects
}

/// Static link boxes (GitHub, Twitter, mail, writing) in a row.
pub fn link_boxes() -> Vec<ObjectDescriptor> {
    [("github", 12.0), ("twitter", 19.0), ("mail", 27.0), ("writing", 35.0)]
        .into_iter()
        .map(|(name, x)| {
            ObjectDescriptor::new(
                format!("link_{name}"),
                Pose::from_position(Vec3::new(x, 2.0, -70.0)),
                ShapeParams::cuboid(LINK_BOX_SIZE),
                0.0,
            )
        })
        .collect()
}

/// Backing box of the name and role text in the projects section.
pub fn projects_box() -> ObjectDescriptor {
    ObjectDescriptor::new(
        "projects_box",
        Pose::from_position(Vec3::new(16.2, 1.0, -20.0)),
        ShapeParams::cuboid(Vec3::new(37.0, 3.0, 2.0)),
        0.0,
    )
}

/// Static label box in front of the skills timeline.
pub fn skills_label_box() -> ObjectDescriptor {
    ObjectDescriptor::new(
        "skills_label",
        Pose::from_position(Vec3::new(61.0, 1.5, -15.0)),
        ShapeParams::cuboid(Vec3::new(12.0, 3.0, 1.0)),
        0.0,
    )
}

/// Running-bond brick wall.
///
/// Even rows hold `bricks_across` full bricks. Odd rows are offset by half a
/// brick: `bricks_across - 1` full bricks flanked by two half-length,
/// half-mass bricks, so both rows span the same width.
pub fn brick_wall(config: &BrickWallConfig) -> Vec<ObjectDescriptor> {
    let size = config.brick_size;
    let across = config.bricks_across.max(1);
    let width = across as f32 * size.x;
    let left = config.center.x - width * 0.5;
    let mut bricks = Vec::new();

    for row in 0..config.rows {
        let y = size.y * (row as f32 + 0.5);
        let odd = row % 2 == 1;
        let mut lengths = Vec::with_capacity(across as usize + 1);
        if odd {
            lengths.push(0.5);
            lengths.extend(std::iter::repeat(1.0).take(across as usize - 1));
            lengths.push(0.5);
        } else {
            lengths.extend(std::iter::repeat(1.0).take(across as usize));
        }

        let mut x = left;
        for (i, fraction) in lengths.into_iter().enumerate() {
            let length = size.x * fraction;
            let center = Vec3::new(x + length * 0.5, y, config.center.z);
            x += length;
            bricks.push(ObjectDescriptor::new(
                format!("brick_{row}_{i}"),
                Pose::new(center, Quat::IDENTITY),
                ShapeParams::cuboid(Vec3::new(length, size.y, size.z)),
                config.mass * fraction,
            ));
        }
    }
    bricks
}

/// Everything except the player ball, which is spawned separately.
pub fn portfolio_scene(bricks: &BrickWallConfig) -> Vec<ObjectDescriptor> {
    let mut objects = vec![grid_plane()];
    objects.extend(boundary_walls());
    objects.extend(billboards());
    objects.extend(link_boxes());
    objects.push(projects_box());
    objects.push(skills_label_box());
    objects.push(beach_ball());
    objects.extend(brick_wall(bricks));
    objects
}
