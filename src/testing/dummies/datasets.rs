use crate::core::{Dataset, FeatureVector};

/// Twelve well-separated rows, four per species.
pub fn tiny_dataset() -> Dataset {
    Dataset::from_csv_str(
        "\
sepal_length,sepal_width,petal_length,petal_width,species
5.1,3.5,1.4,0.2,setosa
4.9,3.0,1.4,0.2,setosa
4.7,3.2,1.3,0.2,setosa
5.0,3.6,1.4,0.2,setosa
7.0,3.2,4.7,1.4,versicolor
6.4,3.2,4.5,1.5,versicolor
5.5,2.3,4.0,1.3,versicolor
6.5,2.8,4.6,1.5,versicolor
6.3,3.3,6.0,2.5,virginica
7.1,3.0,5.9,2.1,virginica
6.5,3.0,5.8,2.2,virginica
7.6,3.0,6.6,2.1,virginica
",
    )
    .expect("tiny dataset parses")
}

/// `(features, expected label)` pairs for a model fitted on Iris.
pub fn reference_features() -> [(FeatureVector, usize); 2] {
    [
        (FeatureVector::new(5.1, 3.5, 1.4, 0.2), 0),
        (FeatureVector::new(6.2, 3.4, 5.4, 2.3), 2),
    ]
}
