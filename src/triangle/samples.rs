//! Built-in sample triangles
//!
//! Standard benchmark triangles from the reserving literature with published
//! chain-ladder results, which makes them useful as fixtures.

use std::fmt;
use std::str::FromStr;

use super::{Triangle, TriangleKind};
use crate::error::LoadError;

/// Named sample datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDataset {
    /// Taylor & Ashe (1983) general insurance triangle, incremental paid
    GenIns,
    /// Reinsurance Association of America casualty triangle, cumulative paid
    Raa,
    /// UK motor insurer (Christofides 1990), cumulative paid, 7×7
    UkMotor,
    /// ABC insurance company (Barnett & Zehnwirth), cumulative paid, 11×11
    Abc,
}

impl SampleDataset {
    pub const ALL: [SampleDataset; 4] = [
        SampleDataset::GenIns,
        SampleDataset::Raa,
        SampleDataset::UkMotor,
        SampleDataset::Abc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SampleDataset::GenIns => "genins",
            SampleDataset::Raa => "raa",
            SampleDataset::UkMotor => "ukmotor",
            SampleDataset::Abc => "abc",
        }
    }

    /// Cumulative triangle for this dataset
    pub fn triangle(self) -> Triangle {
        match self {
            SampleDataset::GenIns => genins(),
            SampleDataset::Raa => raa(),
            SampleDataset::UkMotor => ukmotor(),
            SampleDataset::Abc => abc(),
        }
    }
}

impl fmt::Display for SampleDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleDataset {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "genins" => Ok(SampleDataset::GenIns),
            "raa" => Ok(SampleDataset::Raa),
            "ukmotor" => Ok(SampleDataset::UkMotor),
            "abc" => Ok(SampleDataset::Abc),
            _ => Err(LoadError::UnknownDataset(s.to_string())),
        }
    }
}

const GENINS_INCREMENTAL: [&[f64]; 10] = [
    &[
        357848.0, 766940.0, 610542.0, 482940.0, 527326.0, 574398.0, 146342.0, 139950.0, 227229.0,
        67948.0,
    ],
    &[352118.0, 884021.0, 933894.0, 1183289.0, 445745.0, 320996.0, 527804.0, 266172.0, 425046.0],
    &[290507.0, 1001799.0, 926219.0, 1016654.0, 750816.0, 146923.0, 495992.0, 280405.0],
    &[310608.0, 1108250.0, 776189.0, 1562400.0, 272482.0, 352053.0, 206286.0],
    &[443160.0, 693190.0, 991983.0, 769488.0, 504851.0, 470639.0],
    &[396132.0, 937085.0, 847498.0, 805037.0, 705960.0],
    &[440832.0, 847631.0, 1131398.0, 1063269.0],
    &[359480.0, 1061648.0, 1443370.0],
    &[376686.0, 986608.0],
    &[344014.0],
];

const RAA_CUMULATIVE: [&[f64]; 10] = [
    &[5012.0, 8269.0, 10907.0, 11805.0, 13539.0, 16181.0, 18009.0, 18608.0, 18662.0, 18834.0],
    &[106.0, 4285.0, 5396.0, 10666.0, 13782.0, 15599.0, 15496.0, 16169.0, 16704.0],
    &[3410.0, 8992.0, 13873.0, 16141.0, 18735.0, 22214.0, 22863.0, 23466.0],
    &[5655.0, 11555.0, 15766.0, 21266.0, 23425.0, 26083.0, 27067.0],
    &[1092.0, 9565.0, 15836.0, 22169.0, 25955.0, 26180.0],
    &[1513.0, 6445.0, 11702.0, 12935.0, 15852.0],
    &[557.0, 4020.0, 10946.0, 12314.0],
    &[1351.0, 6947.0, 13112.0],
    &[3133.0, 5395.0],
    &[2063.0],
];

const UKMOTOR_CUMULATIVE: [&[f64]; 7] = [
    &[3511.0, 6726.0, 8992.0, 10704.0, 11763.0, 12350.0, 12690.0],
    &[4001.0, 7703.0, 9981.0, 11161.0, 12117.0, 12746.0],
    &[4355.0, 8287.0, 10233.0, 11755.0, 12993.0],
    &[4295.0, 7750.0, 9773.0, 11093.0],
    &[4150.0, 7897.0, 10217.0],
    &[5102.0, 9650.0],
    &[6283.0],
];

const ABC_CUMULATIVE: [&[f64]; 11] = [
    &[
        153638.0, 342050.0, 476584.0, 564040.0, 624388.0, 666792.0, 698469.0, 719354.0, 735400.0,
        750299.0, 762920.0,
    ],
    &[
        178536.0, 404948.0, 563842.0, 668528.0, 739976.0, 787896.0, 823366.0, 847042.0, 864721.0,
        879641.0,
    ],
    &[210172.0, 469340.0, 657728.0, 780802.0, 864182.0, 920268.0, 958666.0, 984386.0, 1002275.0],
    &[211448.0, 464930.0, 648300.0, 779340.0, 858334.0, 918566.0, 956154.0, 984322.0],
    &[219810.0, 486114.0, 680764.0, 800862.0, 888444.0, 951194.0, 988912.0],
    &[205654.0, 458400.0, 635906.0, 765428.0, 862214.0, 944614.0],
    &[197716.0, 453526.0, 647904.0, 795372.0, 886962.0],
    &[239784.0, 569026.0, 833828.0, 1024228.0],
    &[326304.0, 798048.0, 1173448.0],
    &[420778.0, 1011178.0],
    &[496200.0],
];

fn build(
    kind: TriangleKind,
    first_origin: u32,
    development_step: u32,
    rows: &[&[f64]],
) -> Triangle {
    let origin_labels = (0..rows.len() as u32)
        .map(|i| (first_origin + i).to_string())
        .collect();
    let development_labels = (1..=rows.len() as u32)
        .map(|j| (j * development_step).to_string())
        .collect();
    let rows = rows.iter().map(|r| r.to_vec()).collect();

    Triangle::from_parts(kind, origin_labels, development_labels, rows).to_cumulative()
}

/// Taylor & Ashe general insurance triangle (cumulative)
pub fn genins() -> Triangle {
    build(TriangleKind::Incremental, 2001, 12, &GENINS_INCREMENTAL)
}

/// RAA casualty triangle (cumulative)
pub fn raa() -> Triangle {
    build(TriangleKind::Cumulative, 1981, 12, &RAA_CUMULATIVE)
}

/// UK motor paid triangle (cumulative)
pub fn ukmotor() -> Triangle {
    build(TriangleKind::Cumulative, 2007, 12, &UKMOTOR_CUMULATIVE)
}

/// ABC paid triangle (cumulative)
pub fn abc() -> Triangle {
    build(TriangleKind::Cumulative, 1977, 12, &ABC_CUMULATIVE)
}
